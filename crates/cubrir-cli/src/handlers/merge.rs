//! Merge command handler

use cubrir::resolver::{IdentityResolver, NullLoader};

use crate::commands::MergeArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::handlers::format::load_and_merge;

/// Execute the merge command
pub fn execute_merge(config: &CliConfig, args: &MergeArgs) -> CliResult<()> {
    let set = load_and_merge(&args.input, &IdentityResolver, &NullLoader)?;
    let json = serde_json::to_string_pretty(&set.to_json_report())?;
    std::fs::write(&args.output, json)?;

    if !config.verbosity.is_quiet() {
        println!(
            "Merged {} file(s) covering {} source(s) into {}",
            args.input.len(),
            set.len(),
            args.output.display()
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_coverage(dir: &TempDir, name: &str, source: &str, hits: &[u64]) -> PathBuf {
        let path = dir.path().join(name);
        let json = serde_json::json!({
            "type": "CodeCoverage",
            "coverage": [{ "source": source, "hits": hits }],
        });
        std::fs::write(&path, json.to_string()).unwrap();
        path
    }

    #[test]
    fn test_merge_two_runs() {
        let dir = TempDir::new().unwrap();
        let a = write_coverage(&dir, "run1.json", "lib/x.dart", &[1, 1]);
        let b = write_coverage(&dir, "run2.json", "lib/x.dart", &[1, 2, 7, 0]);
        let output = dir.path().join("all.json");

        let args = MergeArgs {
            input: vec![a, b],
            output: output.clone(),
        };
        execute_merge(&CliConfig::default(), &args).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["type"], "CodeCoverage");
        assert_eq!(
            value["coverage"][0]["hits"],
            serde_json::json!([1, 3, 7, 0])
        );
    }

    #[test]
    fn test_merge_output_is_parseable_input() {
        let dir = TempDir::new().unwrap();
        let a = write_coverage(&dir, "run1.json", "lib/x.dart", &[2, 5]);
        let output = dir.path().join("all.json");

        execute_merge(
            &CliConfig::default(),
            &MergeArgs {
                input: vec![a],
                output: output.clone(),
            },
        )
        .unwrap();

        // The merged document round-trips through the same loader.
        let set = load_and_merge(&[output], &IdentityResolver, &NullLoader).unwrap();
        assert_eq!(set.get("lib/x.dart").unwrap().line_hits[&2], 5);
    }
}
