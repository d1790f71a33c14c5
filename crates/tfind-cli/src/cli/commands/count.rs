//! `tfind count`: data-level match totals.

use std::path::Path;

use anyhow::Result;
use tfind_engine::DataLevelResolver;
use tfind_engine::extract::event_title;
use tfind_engine::transcript::load;

pub fn run(file: &Path, term: &str, by_item: bool) -> Result<()> {
    let resolver = DataLevelResolver::new(load::load_file(file)?);
    let total = resolver.count_all(term);
    if !by_item {
        println!("{total}");
        return Ok(());
    }

    let transcript = resolver.transcript();
    let mut next = (resolver.item_count(term, 0) > 0).then_some(0);
    while let Some(index) = next {
        if let Some(entry) = transcript.get(index) {
            let item = entry.item();
            println!(
                "{index}\t{}\t{}\t{}",
                item.id.as_str(),
                resolver.item_count(term, index),
                event_title(&item.payload)
            );
        }
        next = resolver.next_item_with_matches(term, index);
    }
    println!("total\t{total}");
    Ok(())
}
