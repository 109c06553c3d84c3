use clap::Parser;
use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const CATEGORIES: [&str; 6] = [
    "Electronics",
    "Clothing",
    "Books",
    "Beauty and Health",
    "Home and Kitchen",
    "Sports & Fitness",
];
const LOCATIONS: [&str; 8] = [
    "Delhi",
    "Mumbai",
    "Bangalore",
    "Chennai",
    "Kolkata",
    "Hyderabad",
    "Pune",
    "Ahmedabad",
];
const METHODS: [&str; 5] = ["Credit Card", "Debit Card", "UPI", "Net Banking", "Cash on Delivery"];

/// Writes a synthetic purchase transaction CSV
#[derive(Parser, Debug)]
struct Args {
    #[arg(default_value = "data/transactions.csv")]
    path: PathBuf,

    #[arg(short, long, default_value_t = 100_000)]
    rows: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(dir) = args.path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(&args.path)?;
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "CID,Purchase Date,Net Amount,Product Category,Location,Purchase Method"
    )?;

    let mut rng = rand::rng();
    for i in 0..args.rows {
        let day = rng.random_range(1..=28);
        let month = rng.random_range(1..=12);
        let hour = rng.random_range(0..24);
        let minute = rng.random_range(0..60);
        let second = rng.random_range(0..60);
        let amount: f64 = rng.random_range(10.0..5000.0);
        let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
        let location = LOCATIONS[rng.random_range(0..LOCATIONS.len())];
        let method = METHODS[rng.random_range(0..METHODS.len())];
        writeln!(
            writer,
            "{},{:02}/{:02}/2024 {:02}:{:02}:{:02},{:.2},{},{},{}",
            100_000 + i,
            day,
            month,
            hour,
            minute,
            second,
            amount,
            category,
            location,
            method
        )?;
    }
    writer.flush()?;

    println!("Sample CSV generated: {}", args.path.display());
    Ok(())
}
