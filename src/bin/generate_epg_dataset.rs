use epg_dataset::apps::run_generate_dataset;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    run_generate_dataset(std::env::args().skip(1))
}
