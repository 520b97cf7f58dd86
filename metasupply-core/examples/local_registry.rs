//! Example walking a file through two versions with tracing enabled.
//!
//! Run with: cargo run -p metasupply-core --example local_registry

use metasupply_core::display::{format_timestamp, previous_or_na, short_hash};
use metasupply_core::{
    ForkPolicy, GroupingStrategy, LocalRegistry, Principal, RecordDraft, Revision, Session,
    StaticIdentity,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("metasupply_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== MetaSupply Local Registry Demo ===\n");

    let registry = LocalRegistry::new();
    let identity = StaticIdentity::new(Principal::new("2vxsx-fae"));
    let mut session =
        match Session::start(&identity, |p| Ok(registry.session(p)), ForkPolicy::Allow).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to start session: {}", e);
                return;
            }
        };

    let draft = match RecordDraft::new("report.pdf", "GPT-4", "COCO", "Summarise the report") {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Invalid draft: {}", e);
            return;
        }
    };

    let root = match session.submit(draft).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Upload failed: {}", e);
            return;
        }
    };
    println!("\n{}\n", root.message);

    if let Err(e) = session.revise(&root.id, Revision::model("GPT-4o")).await {
        eprintln!("Revision failed: {}", e);
        return;
    }

    for history in session.histories(GroupingStrategy::ByVerifiedChain) {
        println!("{} ({:?})", history.key.filename, history.status);
        for version in &history.versions {
            println!(
                "   {}  model={:<8} previous={}  {}",
                short_hash(&version.id),
                version.model,
                previous_or_na(version.previous_hash.as_ref()),
                format_timestamp(version.timestamp)
            );
        }
    }
}
