//! End-to-end walkthrough: write synthetic sales data, train, then price a house.
//!
//! Run with: cargo run --example house_price_pipeline

use house_price_ml::{
    HouseFeatures, PricePredictor, TrainingConfig, TrainingPipeline, HOUSE_FEATURES,
};
use std::error::Error;
use std::path::Path;

fn house(i: usize) -> HouseFeatures {
    let sqft_living = 850.0 + ((i * 53) % 3000) as f64;
    HouseFeatures {
        bedrooms: (1 + i % 5) as f64,
        bathrooms: 1.0 + (i % 3) as f64 * 0.75,
        sqft_living,
        sqft_lot: (3000 + (i * 97) % 9000) as f64,
        floors: (1 + i % 3) as f64,
        waterfront: if i % 31 == 0 { 1.0 } else { 0.0 },
        view: (i % 5) as f64,
        condition: (1 + i % 5) as f64,
        grade: (4 + i % 8) as f64,
        sqft_above: sqft_living,
        sqft_basement: 0.0,
        yr_built: (1920 + (i * 13) % 95) as f64,
        yr_renovated: 0.0,
        lat: 47.2 + (i % 40) as f64 * 0.01,
        long: -122.5 + (i % 30) as f64 * 0.02,
        sqft_living15: (900 + (i * 19) % 2500) as f64,
        sqft_lot15: (3500 + (i * 43) % 7000) as f64,
        year: (2014 + i % 2) as f64,
        month: (1 + i % 12) as f64,
        house_age: None,
    }
}

fn price(h: &HouseFeatures) -> f64 {
    let base = 110.0 * h.sqft_living + 30_000.0 * h.grade + 250_000.0 * h.waterfront;
    base + 15_000.0 * h.view - 500.0 * h.house_age()
}

fn write_csv(path: &Path, rows: std::ops::Range<usize>) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["id"];
    header.extend(HOUSE_FEATURES);
    header.push("price");
    writer.write_record(&header)?;
    for i in rows {
        let h = house(i);
        let mut record = vec![i.to_string()];
        record.extend(h.to_row().iter().map(f64::to_string));
        record.push(price(&h).to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter("house_price_ml=info").init();

    let dir = tempfile::tempdir()?;
    let (train, test) = (dir.path().join("train.csv"), dir.path().join("test.csv"));
    write_csv(&train, 0..400)?;
    write_csv(&test, 400..500)?;

    let config = TrainingConfig {
        artifact_dir: dir.path().join("artifact"),
        ..Default::default()
    };
    let summary = TrainingPipeline::new(config.clone()).run(&train, &test)?;
    println!("{}", summary.report);
    println!("Selected {} (R² = {:.4})\n", summary.model_name, summary.score);

    let predictor = PricePredictor::load(config.preprocessor_path(), config.model_path())?;
    for i in [1000, 1001, 1002] {
        let h = house(i);
        println!(
            "{} bed, {} sqft, grade {}: predicted {:.0}, actual {:.0}",
            h.bedrooms,
            h.sqft_living,
            h.grade,
            predictor.predict_one(&h)?,
            price(&h)
        );
    }
    Ok(())
}
