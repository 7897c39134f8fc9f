use elimination::solve_report;
use std::io::{BufRead, BufReader};

/// Reads an augmented matrix from stdin, one row per line with cells
/// separated by commas, then prints the narrated elimination report.
///
/// ```text
/// $ echo "1, 1, 3
/// 1, -1, 1" | cargo run --example cli
/// ```
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for line in BufReader::new(stdin.lock()).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(line.split(',').map(|cell| cell.trim().to_string()).collect());
    }

    if rows.is_empty() {
        eprintln!("No input rows");
        std::process::exit(1);
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);

    let report = solve_report(rows.len(), columns.saturating_sub(1), |r, c| {
        // short rows are padded with empty cells, which parse as zero
        rows[r].get(c).map(String::as_str).unwrap_or("")
    })?;

    println!("{}", report);

    Ok(())
}
