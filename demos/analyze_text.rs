use tone_analyzer::config::ModelConfig;
use tone_analyzer::Analyzer;

fn main() -> anyhow::Result<()> {
    println!("Loading classifiers...");

    let analyzer = Analyzer::load(&ModelConfig::default())?;

    println!("Classifiers loaded.\n");

    let texts = [
        "I love this!",
        "Oh great, another Monday.",
        "The delivery was late and the box was crushed.",
        "",
    ];

    for text in texts {
        let result = analyzer.analyze(text)?;
        println!("{text:?}");
        println!(
            "  {:?} ({:.3}), sarcasm: {} ({:.3})",
            result.assessment, result.confidence, result.sarcasm_detected, result.sarcasm_confidence
        );
        println!("  {result}");
    }

    Ok(())
}
