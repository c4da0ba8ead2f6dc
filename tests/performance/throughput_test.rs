// Performance testing: normalize + serialize throughput on a large feed
// Run with: cargo test --test performance --release -- --ignored

#[cfg(test)]
mod tests {
    use insight_etl::services::normalizer::normalize;
    use insight_etl::services::serializer::serialize;
    use serde_json::{json, Map, Value};
    use std::time::Instant;

    fn large_feed(sols: usize) -> Vec<u8> {
        let mut doc = Map::new();
        let keys: Vec<Value> = (0..sols).map(|i| Value::String(i.to_string())).collect();
        doc.insert("sol_keys".to_string(), Value::Array(keys));
        for i in 0..sols {
            doc.insert(
                i.to_string(),
                json!({
                    "AT": {"av": -60.0, "mn": -90.0, "mx": -20.0},
                    "HWS": {"av": 5.0, "mn": 0.5, "mx": 20.0},
                    "PRE": {"av": 750.0, "mn": 720.0, "mx": 770.0},
                    "First_UTC": "2020-10-19T18:32:20Z",
                    "Last_UTC": "2020-10-20T19:11:55Z"
                }),
            );
        }
        serde_json::to_vec(&Value::Object(doc)).unwrap()
    }

    #[test]
    #[ignore]
    fn test_core_throughput() {
        let sols = 50_000;
        let raw = large_feed(sols);

        let start = Instant::now();
        let records = normalize(&raw).expect("Feed should normalize");
        let normalized = start.elapsed();
        let bytes = serialize(&records).expect("Records should serialize");
        let total = start.elapsed();

        eprintln!("Core throughput ({} sols, {} input bytes):", sols, raw.len());
        eprintln!("  Normalize: {:?}", normalized);
        eprintln!("  Total:     {:?}", total);
        eprintln!("  Output:    {} bytes", bytes.len());

        assert_eq!(records.len(), sols);
        assert_eq!(bytes.iter().filter(|&&b| b == b'\n').count(), sols);
        assert!(total.as_secs() < 30, "Core too slow: {:?}", total);
    }
}
