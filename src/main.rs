use anyhow::{Context, Result};
use bank_placeholders::{
    catalog::{InMemoryCatalog, ItemDefinition},
    config::ConfigLoader,
    logging::init_logger,
    notifications::NotificationCenter,
    placeholders::Placeholders,
    storage::{JsonFileStore, OwnerStorage},
    utils::{display_name, format_quantity, parse_removal_amount},
    Bank, ItemId, TabId,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn demo_catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_items([
        ItemDefinition::new("normal_logs", "Normal Logs").with_sell_price(1),
        ItemDefinition::new("oak_logs", "Oak Logs").with_sell_price(5),
        ItemDefinition::new("copper_ore", "Copper Ore").with_sell_price(2).in_tab(1),
        ItemDefinition::new("iron_ore", "Iron Ore").with_sell_price(5).in_tab(1),
        ItemDefinition::new("raw_shrimp", "Raw Shrimp").with_sell_price(1).in_tab(2),
        ItemDefinition::new("bones", "Bones").with_sell_price(1),
        ItemDefinition::new("feathers", "Feathers").with_sell_price(1),
    ])
}

fn print_help() {
    info!("Commands:");
    info!("  add <item> <qty>          - add items (found in the item log)");
    info!("  remove <item> <qty|all>   - remove items; 'all' on a placeholder releases it");
    info!("  lock <item>               - toggle the lock of an item");
    info!("  empty <tab>               - create an empty filler at the end of a tab");
    info!("  placeholder <item> [tab]  - add a placeholder for a catalog item");
    info!("  release [tab]             - release every placeholder");
    info!("  clear-empties [tab]       - remove every empty filler");
    info!("  fill                      - add placeholders from the completion log");
    info!("  show                      - print the bank");
    info!("  character <name>          - switch character");
    info!("  quit");
}

fn print_bank(placeholders: &Placeholders) {
    let bank = placeholders.bank().read();
    for tab in 0..bank.tab_count() {
        let slots = bank.tab_slots(tab);
        if slots.is_empty() {
            continue;
        }
        info!("Tab {}:", tab);
        for slot in slots {
            let kind = if placeholders.empties().is_filler(&slot.item) {
                "empty"
            } else if slot.quantity == 0 {
                "placeholder"
            } else {
                "item"
            };
            info!(
                "  [{}] {} x{} ({}{})",
                slot.tab_position,
                display_name(slot.item.as_str()),
                format_quantity(slot.quantity),
                kind,
                if bank.is_locked(&slot.item) { ", locked" } else { "" }
            );
        }
    }
    drop(bank);
    info!(
        "Occupied slots: {} (effective {})",
        placeholders.bank().read().occupied_slots(),
        placeholders.effective_occupied()
    );
}

fn parse_tab(arg: Option<&&str>) -> Option<TabId> {
    arg.and_then(|s| s.parse().ok())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger(None)?;
    info!("Starting bank placeholders v{}", VERSION);

    let config_loader = ConfigLoader::new();
    let mut config = config_loader.load()?;

    let storage_dir = config.resolved_storage_dir();
    let character_store = Arc::new(
        JsonFileStore::open(storage_dir.join(format!("character-{}.json", config.character)))
            .context("Failed to open character storage")?,
    );
    let account_store = JsonFileStore::open(storage_dir.join("account.json"))
        .context("Failed to open account storage")?;
    let storage = OwnerStorage::new(character_store.clone(), Arc::new(account_store));

    info!("Character: {}", config.character);
    info!("Only locked: {}", config.settings.only_locked);
    info!("Placeholders use slots: {}", config.settings.use_slots);
    info!("Disabled tabs: {:?}", config.settings.disabled_tabs);

    let bank = Arc::new(RwLock::new(Bank::new(config.bank_tabs)));
    let notifications = Arc::new(NotificationCenter::new());
    let placeholders = Placeholders::new(
        bank,
        Arc::new(demo_catalog()),
        storage,
        notifications,
        config.settings.clone(),
    );

    let registered = placeholders.init().await?;
    info!("Catalog ready ({} filler definition(s) registered)", registered);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(command) = parts.first() else {
            continue;
        };

        match command.to_lowercase().as_str() {
            "add" => match (parts.get(1), parts.get(2).and_then(|q| q.parse::<u64>().ok())) {
                (Some(item), Some(quantity)) => {
                    placeholders.bank().write().add_item(&ItemId::from(*item), quantity, true);
                }
                _ => warn!("Usage: add <item> <qty>"),
            },
            "remove" => match (parts.get(1), parts.get(2).and_then(|q| parse_removal_amount(q))) {
                (Some(item), Some(amount)) => placeholders.remove_item(&ItemId::from(*item), amount),
                _ => warn!("Usage: remove <item> <qty|all>"),
            },
            "lock" => match parts.get(1) {
                Some(item) => match placeholders.bank().write().toggle_lock(&ItemId::from(*item)) {
                    Some(locked) => info!("{} is now {}", item, if locked { "locked" } else { "unlocked" }),
                    None => warn!("{} is not in the bank", item),
                },
                None => warn!("Usage: lock <item>"),
            },
            "empty" => match parse_tab(parts.get(1)) {
                Some(tab) => match placeholders.create_empty(tab).await {
                    Ok(id) => info!("Created {}", id),
                    Err(e) => warn!("Could not create empty item: {}", e),
                },
                None => warn!("Usage: empty <tab>"),
            },
            "placeholder" => match parts.get(1) {
                Some(item) => {
                    if let Err(e) = placeholders.add_placeholder(&ItemId::from(*item), parse_tab(parts.get(2))) {
                        warn!("Could not add placeholder: {}", e);
                    }
                }
                None => warn!("Usage: placeholder <item> [tab]"),
            },
            "release" => {
                placeholders.release_placeholders(parse_tab(parts.get(1)));
            }
            "clear-empties" => {
                placeholders.remove_empties(parse_tab(parts.get(1)));
            }
            "fill" => {
                placeholders.fill_from_completion_log();
            }
            "show" => print_bank(&placeholders),
            "character" => match parts.get(1) {
                Some(name) => {
                    placeholders.switch_character()?;
                    config = config_loader.update_property(|c| c.character = name.to_string())?;
                    info!(
                        "Cleared session data in {:?}; {} is saved as active character and gets its own storage file after a restart",
                        character_store.path(),
                        config.character
                    );
                }
                None => warn!("Usage: character <name>"),
            },
            "help" => print_help(),
            "quit" | "exit" => break,
            other => warn!("Unknown command: {}", other),
        }

        placeholders.bank().write().take_render_queue();
    }

    info!("Goodbye");
    Ok(())
}
