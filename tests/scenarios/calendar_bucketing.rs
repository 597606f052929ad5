use bucketdb::{AggregateOp, BucketSizing, Database, PointValue, Settings, StorageKind, WindowKind};

fn settings(bucket_type: BucketSizing) -> Settings {
    Settings {
        bucket_type,
        storage: StorageKind::Memory,
        enable_events: false,
        ..Settings::default()
    }
}

#[test]
fn hourly_buckets_split_seventy_one_minute_points_into_sixty_and_ten() {
    let db = Database::open(settings(BucketSizing::Hourly)).unwrap();
    let points: Vec<(u32, PointValue)> = (0..70u32)
        .map(|i| (i * 60, PointValue::F32(i as f32)))
        .collect();
    db.insert("hourly-key", points).unwrap();

    let rs = db.query("hourly-key", 0, u32::MAX).unwrap();
    assert_eq!(rs.len(), 70);
    let windows = rs.hourly();
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].1.len(), 60);
    assert_eq!(windows[1].1.len(), 10);
}

/// Ten days of ten-minute samples, value = minute-of-day index mod 6 (one
/// cycle of 0..5 per hour, so the hourly mean is always 2.5 and the daily
/// sum is `24 * 15 = 360.0`).
#[test]
fn daily_sum_and_hourly_mean_over_ten_days_of_ten_minute_samples() {
    let db = Database::open(settings(BucketSizing::Dynamic)).unwrap();
    let points_per_day = 144u32; // 24h * 6 samples/hour at 10-minute spacing
    let mut points = Vec::new();
    for day in 0..10u32 {
        for i in 0..points_per_day {
            let ts = day * 86_400 + i * 600;
            let value = (i % 6) as f32; // cycles 0,1,2,3,4,5 every hour
            points.push((ts, PointValue::F32(value)));
        }
    }
    db.insert("telemetry", points).unwrap();

    let rs = db.query("telemetry", 0, u32::MAX).unwrap();
    assert_eq!(rs.len(), 1440);

    let daily_sums = rs.aggregation(WindowKind::Daily, AggregateOp::Sum).unwrap();
    assert_eq!(daily_sums.len(), 10);
    for (_, sum) in &daily_sums {
        assert!((sum - 360.0).abs() < 1e-3);
    }

    let hourly_means = rs.aggregation(WindowKind::Hourly, AggregateOp::Mean).unwrap();
    assert_eq!(hourly_means.len(), 240);
    for (_, mean) in &hourly_means {
        assert!((mean - 2.5).abs() < 1e-3);
    }
}

#[test]
fn full_aggregation_reports_min_max_alongside_sum_and_count() {
    let db = Database::open(settings(BucketSizing::Dynamic)).unwrap();
    let points: Vec<(u32, PointValue)> = (0..24u32)
        .map(|h| (h * 3600, PointValue::F32(h as f32)))
        .collect();
    db.insert("hourly-values", points).unwrap();

    let rs = db.query("hourly-values", 0, u32::MAX).unwrap();
    let daily = rs.full_aggregation(WindowKind::Daily).unwrap();
    assert_eq!(daily.len(), 1);
    let agg = daily[0].1;
    assert_eq!(agg.min, 0.0);
    assert_eq!(agg.max, 23.0);
    assert_eq!(agg.count, 24.0);
    assert_eq!(agg.sum, (0..24).sum::<i32>() as f32);
}
