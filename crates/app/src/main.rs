use anyhow::Context;

use combotrack_app::{AppConfig, ComboTrack};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    combotrack_observability::init();

    let config = AppConfig::from_env();

    if let Some(parent) = config.database_path().as_deref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create database directory {}", parent.display()))?;
        }
    }

    let pool = combotrack_infra::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    combotrack_infra::migrate(&pool)
        .await
        .context("failed to apply schema")?;

    let channel = config.mail_channel().context("failed to configure mail channel")?;
    let app = ComboTrack::new(pool, &config.notify, channel);

    let combo_types = app.list_combo_types().await;
    let customers = app.list_customers().await;
    let active_combos: usize = customers.iter().map(|c| c.combos.len()).sum();

    tracing::info!(
        database = %config.database_url,
        templates = %config.notify.template_dir.display(),
        combo_types = combo_types.len(),
        customers = customers.len(),
        active_combos,
        "combotrack ready"
    );
    for combo_type in &combo_types {
        tracing::info!(
            id = %combo_type.id,
            name = %combo_type.name,
            total_uses = combo_type.total_uses,
            "combo type"
        );
    }

    Ok(())
}
