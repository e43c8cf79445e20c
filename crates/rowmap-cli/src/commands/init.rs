//! Create a starter mapping

use anyhow::Result;
use std::fs;
use std::path::Path;

const STARTER_MAPPING: &str = r#"# rowmap mapping file
#
# Each transformer maps one input record to one output record.
# Field forms:
#   name: source_key
#   name: { key: source_key, default: value, filter: upper }
#   name: { template: "{{ a }} {{ b }}" }
#   name: { regex: { key: source_key, pattern: '(\d+)-(\d+)' } }
#   name: { coalesce: [key_a, key_b] }
#   name: { value: constant }
# A name joined with "__" (e.g. first__last) splits a sequence result
# across several outputs.

transformers:
  person:
    fields:
      lastname: lastname
      firstname: firstname
      fullname: { template: "{{ firstname }} {{ lastname }}" }

  contact:
    extends: person
    fields:
      email: { coalesce: [work_email, home_email] }
    rename:
      fullname: display_name

combine:
  people: person
  contacts: contact
"#;

const SAMPLE_INPUT: &str = r#"{"firstname": "Alice", "lastname": "Johnson", "work_email": "alice@example.com"}
{"firstname": "Bob", "lastname": "Smith", "home_email": "bob@example.com"}
{"firstname": "Carol", "lastname": "Williams", "work_email": null, "home_email": "carol@example.com"}
"#;

/// Run the init command
pub async fn run(path: &str) -> Result<()> {
    let dir = Path::new(path);

    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    if dir.join("rowmap.yaml").exists() {
        anyhow::bail!(
            "Directory '{}' already contains a rowmap.yaml",
            dir.display()
        );
    }

    fs::write(dir.join("rowmap.yaml"), STARTER_MAPPING)?;
    fs::create_dir_all(dir.join("data"))?;
    fs::write(dir.join("data/input.jsonl"), SAMPLE_INPUT)?;

    tracing::info!("✓ Created rowmap.yaml in {}", dir.display());
    tracing::info!("");
    tracing::info!("Next steps:");
    if path != "." {
        tracing::info!("  cd {}", dir.display());
    }
    tracing::info!("  rowmap validate");
    tracing::info!("  rowmap run --input data/input.jsonl");

    Ok(())
}
