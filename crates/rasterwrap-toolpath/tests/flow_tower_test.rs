use image::{GrayImage, Luma};
use rasterwrap_core::VolumetricFlow;
use rasterwrap_toolpath::{
    BlockLabelRasterizer, ExtrusionMode, FlowTowerGenerator, FlowTowerParameters,
    ProcessParameters, SegmentSource, TracerSettings,
};

fn volumetric() -> ProcessParameters {
    ProcessParameters::new(0.4, 0.25, ExtrusionMode::Volumetric).unwrap()
}

#[test]
fn test_default_tower_gcode() {
    let generator = FlowTowerGenerator::new(
        volumetric(),
        TracerSettings::default(),
        FlowTowerParameters::default(),
        SegmentSource::labels(BlockLabelRasterizer::default()),
    )
    .unwrap();
    let gcode = generator.generate().unwrap();

    assert!(gcode.starts_with(";FLAVOR:UltiGCode\n;TIME:0\n;MATERIAL:1\n;MATERIAL2:0\n"));
    assert!(gcode.contains(";NOZZLE_DIAMETER:0.4\n"));
    assert!(gcode.contains("G0 X141.5 Y111.5\n"));
    assert!(gcode.contains("M106 S255\n; 7 mm^3/s\nG0 F4200\n"));
    assert!(gcode.contains("; 10 mm^3/s\nG0 F6000\n"));
    assert!(gcode.contains("; LAYER 1\nG0 Z0.25\n"));
    assert!(gcode.contains("; LAYER 40\nG0 Z10\n"));
    // rim of the first segment, then the second segment starts at 42
    assert!(gcode.contains("G0 Z10.25\n"));
    assert!(gcode.contains("; LAYER 42\nG0 Z10.5\n"));
    assert!(!gcode.contains("; LAYER 41\n"));
    // 4 segments x (40 layers + rim), the last rim is layer 164
    assert!(gcode.contains("; LAYER 163\n"));
    assert!(!gcode.contains("; LAYER 164\n"));
}

#[test]
fn test_linear_mode_uses_less_e() {
    let linear = ProcessParameters::new(
        0.4,
        0.25,
        ExtrusionMode::LinearLength {
            filament_diameter: 2.85,
        },
    )
    .unwrap();
    let tower = FlowTowerParameters {
        flow_rates: vec![VolumetricFlow(8.0)],
        segment_height: 1.0,
        ..Default::default()
    };

    let volumetric_summary = FlowTowerGenerator::new(
        volumetric(),
        TracerSettings::default(),
        tower.clone(),
        SegmentSource::labels(BlockLabelRasterizer::default()),
    )
    .unwrap()
    .generate_to_writer(Vec::new())
    .unwrap()
    .1;
    let linear_summary = FlowTowerGenerator::new(
        linear,
        TracerSettings::default(),
        tower,
        SegmentSource::labels(BlockLabelRasterizer::default()),
    )
    .unwrap()
    .generate_to_writer(Vec::new())
    .unwrap()
    .1;

    let area = std::f64::consts::PI * (2.85f64 / 2.0).powi(2);
    assert_eq!(volumetric_summary.points, linear_summary.points);
    approx::assert_relative_eq!(
        linear_summary.extrusion,
        volumetric_summary.extrusion / area,
        max_relative = 1e-9
    );
}

#[test]
fn test_generate_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tower.gcode");

    let mut image = GrayImage::new(16, 4);
    image.put_pixel(3, 3, Luma([255]));
    let tower = FlowTowerParameters {
        flow_rates: vec![VolumetricFlow(7.0), VolumetricFlow(7.5)],
        segment_height: 1.0,
        ..Default::default()
    };
    let generator = FlowTowerGenerator::new(
        volumetric(),
        TracerSettings::default(),
        tower,
        SegmentSource::Image(image),
    )
    .unwrap();

    let summary = generator.generate_to_file(&path).unwrap();
    assert_eq!(summary.layers, 2 * 5);

    let gcode = std::fs::read_to_string(&path).unwrap();
    assert!(gcode.contains("; 7.5 mm^3/s\nG0 F4500\n"));
    let g1_lines = gcode.lines().filter(|l| l.starts_with("G1 ")).count();
    assert_eq!(g1_lines, summary.points);
}

#[test]
fn test_unwritable_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("tower.gcode");
    let generator = FlowTowerGenerator::new(
        volumetric(),
        TracerSettings::default(),
        FlowTowerParameters::default(),
        SegmentSource::labels(BlockLabelRasterizer::default()),
    )
    .unwrap();
    assert!(generator.generate_to_file(&path).is_err());
}
