use anyhow::Result;
use buffer_diff::{DiffGranularity, TextDiff};

fn main() -> Result<()> {
    // Sample texts with word-level differences
    let text1 = "This is the first paragraph with some words.\nHere is another line with minor changes.\nThis line is unchanged.";
    let text2 = "This is the first paragraph with different words.\nHere is another sentence with major changes.\nThis line is unchanged.";

    for granularity in [DiffGranularity::Line, DiffGranularity::Word, DiffGranularity::Char] {
        let chunks = TextDiff::diff_with_granularity(text1, text2, granularity)?;
        println!("=== {:?}: {} chunks ===", granularity, chunks.len());

        for chunk in &chunks {
            let old: String = text1.chars().skip(chunk.from_a).take(chunk.len_a()).collect();
            let new: String = text2.chars().skip(chunk.from_b).take(chunk.len_b()).collect();
            println!("{} {}: {:?} -> {:?}", chunk, chunk.kind(), old, new);
        }
        println!();
    }

    Ok(())
}
