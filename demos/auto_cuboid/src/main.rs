use argh::FromArgs;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use cloudbox::k3d::annotation::CuboidAnnotations;
use cloudbox::k3d::context::{PipelineConfig, PointCloudContext};
use cloudbox::k3d::pointcloud::PointCloud;
use cloudbox::k3d::transforms::{display_to_raw, raw_to_display};

mod kitti;

#[derive(FromArgs)]
/// Fit a cuboid around the object under a picked point.
struct Args {
    /// path to a KITTI velodyne scan (.bin); a synthetic scene is used when omitted
    #[argh(option, short = 'i')]
    input: Option<PathBuf>,

    /// path to a JSON pipeline configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// picked position in the display frame, as x,y,z
    #[argh(option, from_str_fn(parse_point))]
    seed: Option<[f32; 3]>,

    /// normal angle threshold in degrees
    #[argh(option)]
    threshold: Option<f32>,

    /// neighbor search radius in meters
    #[argh(option)]
    max_distance: Option<f32>,

    /// maximum number of points in the region
    #[argh(option)]
    max_region_size: Option<usize>,

    /// number of neighbors used to estimate normals
    #[argh(option)]
    k: Option<usize>,

    /// estimate normals in parallel
    #[argh(switch)]
    parallel: bool,
}

fn parse_point(value: &str) -> Result<[f32; 3], String> {
    let coords = value
        .split(',')
        .map(|c| c.trim().parse::<f32>().map_err(|e| format!("{c}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match coords.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(format!("expected x,y,z, got {value}")),
    }
}

/// A ground plane with a 2 x 1 x 1 box standing on it, centered at (5, 5).
fn synthetic_scene(rng: &mut StdRng) -> Vec<[f32; 3]> {
    let mut points = Vec::new();
    while points.len() < 6000 {
        let (x, y) = (rng.random_range(0.0..10.0), rng.random_range(0.0..10.0));
        if !((3.9..6.1).contains(&x) && (4.4..5.6).contains(&y)) {
            points.push([x, y, rng.random_range(-0.005..0.005)]);
        }
    }
    for _ in 0..1000 {
        points.push([rng.random_range(4.0..6.0), rng.random_range(4.5..5.5), 1.0]);
    }
    for _ in 0..800 {
        let z = rng.random_range(0.0..1.0);
        let side = if rng.random_bool(0.5) { 4.5 } else { 5.5 };
        points.push([rng.random_range(4.0..6.0), side, z]);
    }
    points
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.region.normal_threshold_deg = threshold;
    }
    if let Some(max_distance) = args.max_distance {
        config.region.max_distance = max_distance;
    }
    if let Some(max_region_size) = args.max_region_size {
        config.region.max_region_size = max_region_size;
    }
    if let Some(k) = args.k {
        config.normals.k = k;
    }
    config.normals.parallel |= args.parallel;

    let (cloud, default_pick) = match &args.input {
        Some(path) => {
            let cloud = kitti::read_kitti_bin(path)?;
            log::info!("loaded {} points from {}", cloud.len(), path.display());
            (cloud, [0.0, 0.0, 0.0])
        }
        None => {
            let mut rng = StdRng::seed_from_u64(0);
            let cloud = PointCloud::new(synthetic_scene(&mut rng), None)?;
            log::info!("generated a synthetic scene with {} points", cloud.len());
            (cloud, raw_to_display(&[5.0, 5.0, 1.0]))
        }
    };

    let ctx = PointCloudContext::new(&cloud, &config)?;

    let picked = args.seed.unwrap_or(default_pick);
    let Some((region, obb)) = ctx.auto_cuboid(&display_to_raw(&picked), &config.region)? else {
        println!("The point cloud is empty");
        return Ok(());
    };

    println!(
        "Seed point #{} at {:?}, region of {} points",
        region.seed,
        ctx.points()[region.seed],
        region.len()
    );
    println!("Center: {:?}", obb.center);
    println!("Half extents: {:?}", obb.half_extents);
    for (i, axis) in obb.axes.iter().enumerate() {
        println!("Axis {i}: {axis:?}");
    }
    println!("Volume: {:.3} m^3", obb.volume());

    let mut annotations = CuboidAnnotations::new();
    let id = annotations.confirm(&region, obb);
    if let Some(annotation) = annotations.get(id) {
        println!("Confirmed '{}' (id {})", annotation.label, annotation.id);
    }

    Ok(())
}
