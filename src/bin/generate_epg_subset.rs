use epg_dataset::apps::run_generate_subset;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    run_generate_subset(std::env::args().skip(1))
}
