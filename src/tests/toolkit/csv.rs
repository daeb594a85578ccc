//! "csv" description helps the testbench describe traces

/// CSV to trace samples
pub fn trace_csv(csv: &str) -> Vec<f64> {
    csv.split(',')
        .map(|c| {
            let c = c.trim();
            if let Ok(sample) = c.parse::<f64>() {
                sample
            } else {
                panic!("invalid sample \"{}\" in csv", c);
            }
        })
        .collect()
}
