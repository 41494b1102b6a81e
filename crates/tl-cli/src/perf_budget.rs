use std::time::Instant;

use tl_core::{Engine, EngineOptions, MemoryHost};

use crate::page;

pub struct PerfBudgetOptions {
    pub paragraphs: usize,
    pub insertions: usize,
}

const BUDGET_FULL_SCAN_MS: f64 = 250.0;
const BUDGET_FLUSH_P99_US: f64 = 2000.0;
const BUDGET_ROLLBACK_MS: f64 = 100.0;

const PROSE: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod.";
const LINKED: &str = "See https://github.com/rust-lang/regex and https://doi.org/10.1/x for details.";

pub fn run_perf_budget(opts: PerfBudgetOptions) -> Result<(), String> {
    println!("Performance Budget Check");
    println!("==================================================");

    println!("Building page with {} paragraphs...", opts.paragraphs);
    let html = synthetic_page(opts.paragraphs);
    let doc = tl_html::parse_document(&html);
    let mut engine = Engine::new(doc, MemoryHost::new(), EngineOptions::default())
        .map_err(|e| format!("Failed to prepare page: {}", e))?;
    let original_text = page::body_text(&engine);

    println!("Scanning...");
    let scan_begin = Instant::now();
    let report = engine
        .start()
        .map_err(|e| format!("Scan failed: {}", e))?
        .unwrap_or_default();
    let scan_ms = scan_begin.elapsed().as_secs_f64() * 1000.0;
    println!("  {} text nodes rewritten, {} controls", report.rewritten, report.controls);

    println!("Measuring mutation flush latency...");
    let latencies = measure_flush_latency(&mut engine, opts.insertions)?;
    let p99_us = percentile(&latencies, 0.99);

    println!("Rolling back...");
    let rollback_begin = Instant::now();
    let undone = engine.rollback();
    let rollback_ms = rollback_begin.elapsed().as_secs_f64() * 1000.0;
    if undone.failed > 0 {
        return Err(format!("Rollback skipped {} nodes", undone.failed));
    }

    let mut passed = true;
    println!();
    println!("Results");
    println!("--------------------------------------------------");

    passed &= report_budget("Full Scan", scan_ms, BUDGET_FULL_SCAN_MS, "ms");
    passed &= report_budget("Flush P99 Latency", p99_us, BUDGET_FLUSH_P99_US, "μs");
    passed &= report_budget("Rollback", rollback_ms, BUDGET_ROLLBACK_MS, "ms");

    // Inserted paragraphs stay in the body after rollback.
    let restored = page::body_text(&engine);
    let text_ok = restored.starts_with(&original_text);
    println!("{} Text restored: {}", if text_ok { "✓" } else { "✗" }, text_ok);
    passed &= text_ok;

    println!();
    println!("==================================================");

    if passed {
        println!("✓ All performance budgets passed");
        Ok(())
    } else {
        Err("Performance budget exceeded".to_string())
    }
}

fn synthetic_page(paragraphs: usize) -> String {
    let mut html = String::from("<!doctype html><html><head><title>perf</title></head><body>");
    for i in 0..paragraphs {
        html.push_str("<section><p>");
        html.push_str(if i % 4 == 0 { LINKED } else { PROSE });
        html.push_str("</p>");
        if i % 50 == 0 {
            html.push_str("<pre>curl https://api.example.com/v1/items</pre>");
        }
        html.push_str("</section>");
    }
    html.push_str("</body></html>");
    html
}

fn measure_flush_latency(engine: &mut Engine<MemoryHost>, insertions: usize) -> Result<Vec<f64>, String> {
    let mut latencies = Vec::with_capacity(insertions);

    for i in 0..insertions {
        let fragment = format!("<div><p>item {i}: https://example.com/items/{i}</p></div>");
        let doc = engine.document_mut();
        let body = doc.body().unwrap_or_else(|| doc.root());
        tl_html::append_fragment(doc, body, &fragment)
            .map_err(|e| format!("Failed to insert fragment: {}", e))?;

        let start = Instant::now();
        let report = engine.flush_mutations();
        latencies.push(start.elapsed().as_secs_f64() * 1_000_000.0);

        if report.highlights != 1 {
            return Err(format!("Insertion {} produced {} highlights", i, report.highlights));
        }
    }

    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(latencies)
}

fn report_budget(name: &str, actual: f64, limit: f64, unit: &str) -> bool {
    let passed = actual <= limit;
    let status = if passed { "✓" } else { "✗" };
    println!(
        "{} {}: {:.2} {} (limit: {:.2} {})",
        status, name, actual, unit, limit, unit
    );
    passed
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(percentile(&sorted, 0.99), 10.0);
        assert_eq!(percentile(&sorted, 0.5), 5.0);
        assert_eq!(percentile(&[], 0.99), 0.0);
    }

    #[test]
    fn test_synthetic_page_counts() {
        let html = synthetic_page(8);
        assert_eq!(html.matches("<section>").count(), 8);
        assert_eq!(html.matches("https://github.com").count(), 2);
    }

    #[test]
    fn test_flush_latency_small_page() {
        let doc = tl_html::parse_document(&synthetic_page(4));
        let mut engine = Engine::new(doc, MemoryHost::new(), EngineOptions::default()).unwrap();
        engine.start().unwrap();
        let latencies = measure_flush_latency(&mut engine, 3).unwrap();
        assert_eq!(latencies.len(), 3);
        assert!(latencies.windows(2).all(|w| w[0] <= w[1]));
    }
}
