use geometric_hashing::*;

fn main() {
    println!("=== geometric-hashing: approximate ball aggregation ===\n");

    grid_example();
    println!();
    face_example();
    println!();
    config_example();
}

fn cluster_points() -> Vec<Point> {
    let mut points = Vec::new();
    for i in 0..5 {
        points.push(Point::new(vec![i, i]));
        points.push(Point::new(vec![100 + i, 100 - i]));
    }
    points
}

fn grid_example() {
    println!("1. Grid hashing");
    println!("---------------");

    let mut source = RandomSource::from_seed(7, 1.0);
    let scheme = GridHashing::new(2, 5.0, &mut source);
    println!("cell size {}, Γ = {:.3}", scheme.cell_size(), GridHashing::gamma_for(2));

    let points = cluster_points();
    let counts = bucket_values(&scheme, &points, &Count, |_| 1);
    println!("{} points in {} buckets", points.len(), counts.len());

    for (id, center) in [Point::new(vec![2, 2]), Point::new(vec![50, 50])].into_iter().enumerate() {
        let tagged = TaggedPoint::new(id, center);
        let n = scheme.eval_ball(&tagged, 5.0, &Count, &counts);
        println!("  ball around {:?}: ~{} points", tagged.coords(), n);
    }
}

fn face_example() {
    println!("2. Face hashing");
    println!("---------------");

    let mut source = RandomSource::from_seed(7, 1.0);
    let scheme = FaceHashing::new(2, 5.0, &mut source);
    println!(
        "hypercube side {}, epsilon {}, Γ = {:.3}",
        scheme.hypercube_side(),
        scheme.epsilon(),
        FaceHashing::gamma_for(2)
    );

    let points = cluster_points();
    let nearest = bucket_values(&scheme, &points, &Min::new(), |p| Some(p[0].abs() + p[1].abs()));

    let tagged = TaggedPoint::new(0, Point::new(vec![98, 98]));
    let found = scheme.eval_ball(&tagged, 5.0, &Min::new(), &nearest);
    println!("  smallest L1 norm near {:?}: {:?}", tagged.coords(), found);
}

fn config_example() {
    println!("3. Scheme from configuration");
    println!("----------------------------");

    for name in ["grid_hashing", "face_hashing", "ball_hashing"] {
        match name.parse::<HashingSchemeChoice>() {
            Ok(choice) => {
                let config = SchemeConfig::new(choice, 3, 2.0).with_seed(0x6004_2651_f648_e052);
                match config.build::<u64>() {
                    Ok(scheme) => println!(
                        "  {choice}: Γ = {:.3}, hash of origin = {}",
                        scheme.gamma(),
                        scheme.hash(&Point::zeros(3))
                    ),
                    Err(e) => println!("  {choice}: {e}"),
                }
            }
            Err(e) => println!("  {name}: {e}"),
        }
    }
}
