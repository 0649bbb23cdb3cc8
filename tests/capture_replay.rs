//! Driver and capture replay tests

use anyhow::{Context, Result};
use futures::StreamExt;
use meterlink::{
    CaptureSource, ChannelSource, DeviceKind, Driver, EnergyMeterRecord, MeasurementRecord,
    Meterlink, PipelineConfig,
};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn energy(record: &MeasurementRecord) -> &EnergyMeterRecord {
    record.as_energy_meter().expect("energy meter record")
}

#[tokio::test]
async fn capture_replays_through_driver() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let source = CaptureSource::open(fixture("energy_meter_capture.yaml"))
        .context("opening capture fixture")?;
    let session = Meterlink::energy_meter(PipelineConfig::default())?;
    let records = session.subscribe();

    let stats = Driver::spawn(source, session).join().await?;
    assert_eq!(stats.packets, 7);
    assert_eq!(stats.frames, 2, "stale pair must not be stitched");
    assert_eq!(stats.records, 2);

    let records: Vec<MeasurementRecord> = records.collect().await;
    assert_eq!(records.len(), 2);

    let EnergyMeterRecord::Ac(ac) = energy(&records[0]) else {
        panic!("first reading should be AC: {:?}", records[0]);
    };
    assert_eq!(ac.voltage_v, 123.4);
    assert_eq!(ac.current_a, 1.5);
    assert_eq!(ac.frequency_hz, 50.0);
    assert_eq!(ac.backlight_time_s, 60.0);

    let EnergyMeterRecord::Usb(usb) = energy(&records[1]) else {
        panic!("second reading should be USB: {:?}", records[1]);
    };
    assert_eq!(usb.voltage_v, 5.0);
    assert_eq!(usb.current_a, 1.0);
    assert_eq!(usb.temp_c, 28.0);
    assert_eq!(usb.on_time_s, 120.0);
    assert_eq!(usb.backlight_time_s, 30.0);
    Ok(())
}

#[tokio::test]
async fn replay_entry_point_streams_records() -> Result<()> {
    let (handle, records) = Meterlink::replay(
        DeviceKind::EnergyMeter,
        fixture("energy_meter_capture.yaml"),
        PipelineConfig::default(),
    )?;

    let modes: Vec<u8> = records.map(|r| energy(&r).mode()).collect().await;
    assert_eq!(modes, vec![1, 3]);
    handle.join().await?;
    Ok(())
}

#[tokio::test]
async fn narrow_window_from_config_drops_slow_pairs() -> Result<()> {
    let config = PipelineConfig::from_yaml_str("pair_window_ms: 20")?;
    let source = CaptureSource::open(fixture("energy_meter_capture.yaml"))?;
    let session = Meterlink::energy_meter(config)?;

    // The AC pair is 40 ms apart, the USB pair 30 ms
    let stats = Driver::spawn(source, session).join().await?;
    assert_eq!(stats.frames, 0);
    Ok(())
}

#[tokio::test]
async fn channel_source_feeds_multimeter_session() -> Result<()> {
    let (tx, source) = ChannelSource::new(16);
    let session = Meterlink::multimeter(PipelineConfig::default())?;
    let mut records = session.subscribe();
    let handle = Driver::spawn(source, session);

    let mut frame = vec![0xF2, 0x21, 0x71, 0x23, 0x45, 0x83, 0x01, 0x30, 0x39];
    frame.resize(18, 0);
    frame.push(frame.iter().fold(0, |acc, b| acc ^ b));

    // Two frames spread over 20-byte notifications
    let mut stream = frame.clone();
    stream.extend_from_slice(&frame);
    for (i, chunk) in stream.chunks(20).enumerate() {
        tx.send(chunk, i as u64 * 10).await?;
    }

    for _ in 0..2 {
        let record = records.next().await.context("record stream ended early")?;
        let meter = record.as_multimeter().context("multimeter record")?;
        assert_eq!(meter.main_mode, 3);
        // 0x83 carries the high bit pair 0b10 above the 16-bit value
        assert_eq!(meter.main_value, (0x80 << 10) | 12345);
    }

    handle.cancel();
    let stats = handle.join().await?;
    assert_eq!(stats.records, 2);
    Ok(())
}

#[tokio::test]
async fn missing_capture_is_file_error() {
    let err = CaptureSource::open(fixture("missing.yaml")).unwrap_err();
    assert!(matches!(err, meterlink::MeterError::File { .. }));
    assert!(!err.is_retryable());
}
