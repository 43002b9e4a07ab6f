fn main() {
    eprintln!("Use specific binaries:");
    eprintln!("  cargo run --bin upload -- trades.csv");
    eprintln!("  cargo run --bin balance -- --timestamp \"26-09-2022 12:00\"");
    eprintln!("");
    eprintln!("Add --update flag to write uploads to the database:");
    eprintln!("  cargo run --bin upload -- trades.csv --update");
    eprintln!("");
    eprintln!("Other options:");
    eprintln!("  --utc             read times as UTC instead of local time (both binaries)");
    eprintln!("  --abort-on-error  upload: store nothing if any row is rejected");
}
