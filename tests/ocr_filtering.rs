use cordex::capture::median::SampleBuffer;
use cordex::capture::sampler::{parse_reading, SampleConfig};

fn feed(buffer: &mut SampleBuffer, texts: &[&str], config: &SampleConfig) -> Vec<(f64, f64)> {
    let mut emitted = Vec::new();
    for text in texts {
        if let Some((long, lat)) = parse_reading(text, config) {
            buffer.push(long, lat);
            if let Some(point) = buffer.median_point() {
                emitted.push(point);
            }
        }
    }
    emitted
}

#[test]
fn raw_reads_flow_through_the_filter() {
    let config = SampleConfig {
        buffer_size: 3,
        ..SampleConfig::default()
    };
    let mut buffer = SampleBuffer::new(config.buffer_size);

    // Two garbage reads, then three plausible ones.
    let emitted = feed(
        &mut buffer,
        &[
            "single line only",
            "12\n34",
            "-120,5\n300,0",
            "-121,0\n301,5",
            "-119,5\n299,0",
        ],
        &config,
    );

    // Nothing is emitted until the window fills, then each push emits.
    assert_eq!(emitted.len(), 1);
    let (long, lat) = emitted[0];
    assert!((lat - (-120.5)).abs() < 1e-9);
    assert!((long - 300.0).abs() < 1e-9);
}

#[test]
fn misread_currency_glyphs_become_eights() {
    let config = SampleConfig::default();
    let (long, lat) = parse_reading("-1%5.2\n20£.4", &config).unwrap();
    assert!((lat - (-185.2)).abs() < 1e-9);
    assert!((long - 208.4).abs() < 1e-9);
}

#[test]
fn out_of_bounds_reads_are_rejected() {
    let config = SampleConfig::default();
    // Longitude below the exclusive lower bound.
    assert!(parse_reading("100.0\n-560.0", &config).is_none());
    // Latitude above the exclusive upper bound.
    assert!(parse_reading("674.0\n100.0", &config).is_none());
}
