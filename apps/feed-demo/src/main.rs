mod app;
mod feed;
mod host;

use app::Demo;

fn main() -> anyhow::Result<()> {
    #[cfg(feature = "logging")]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    println!("=== Endless Feed Demo ===");
    println!("Pages of ten numbers, cursors -4..=4, scrolled headlessly to every loading edge.");
    println!();

    for demo in Demo::ALL {
        let report = demo.run()?;
        println!(
            "{:<36} {:>3} items in {} pages, scroll_top {:>6.1}, rows {} .. {}",
            report.demo.title(),
            report.items,
            report.pages,
            report.scroll_top,
            report.first_row,
            report.last_row
        );
    }
    Ok(())
}
