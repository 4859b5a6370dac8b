// [libs/infra/db/src/schema.rs]
/*!
 * =================================================================
 * APARATO: FLEETSYNC DATABASE SCHEMA
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Tres fases: génesis de tablas, mutaciones de columna para despliegues
 * en caliente y endurecimiento por índices. Todas las marcas temporales
 * se escriben como RFC3339 UTC desde el proceso; ninguna columna
 * comparada usa CURRENT_TIMESTAMP.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

const BASE_TABLES: &[(&str, &str)] = &[
    ("TABLE_DEVICES", r#"
        CREATE TABLE IF NOT EXISTS devices (
            serial_number TEXT PRIMARY KEY,
            push_version TEXT NOT NULL DEFAULT '',
            language TEXT NOT NULL DEFAULT '',
            firmware_version TEXT,
            ip_address TEXT,
            fingerprint_algorithm TEXT,
            options_json TEXT NOT NULL DEFAULT '{}',
            operlog_stamp TEXT,
            biodata_stamp TEXT,
            idcard_stamp TEXT,
            errorlog_stamp TEXT,
            registered_at TEXT NOT NULL,
            last_seen TEXT NOT NULL
        );
    "#),
    ("TABLE_USERS", r#"
        CREATE TABLE IF NOT EXISTS users (
            pin TEXT PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            privilege INTEGER NOT NULL DEFAULT 0,
            password TEXT NOT NULL DEFAULT '',
            card TEXT NOT NULL DEFAULT '',
            group_id TEXT NOT NULL DEFAULT '',
            time_zone TEXT NOT NULL DEFAULT '0000000000000000',
            verify_mode INTEGER NOT NULL DEFAULT -1,
            vice_card TEXT NOT NULL DEFAULT '',
            source_serial TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL
        );
    "#),
    ("TABLE_BIOMETRIC_TEMPLATES", r#"
        CREATE TABLE IF NOT EXISTS biometric_templates (
            pin TEXT NOT NULL,
            bio_type INTEGER NOT NULL,
            slot_number INTEGER NOT NULL,
            template_index INTEGER NOT NULL,
            valid INTEGER NOT NULL DEFAULT 1,
            duress INTEGER NOT NULL DEFAULT 0,
            major_version TEXT NOT NULL DEFAULT '0',
            minor_version TEXT NOT NULL DEFAULT '0',
            format_tag TEXT NOT NULL DEFAULT '',
            template_blob TEXT NOT NULL,
            source_serial TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL,
            PRIMARY KEY (pin, bio_type, slot_number, template_index)
        );
    "#),
    ("TABLE_USER_PHOTOS", r#"
        CREATE TABLE IF NOT EXISTS user_photos (
            pin TEXT PRIMARY KEY,
            file_name TEXT NOT NULL DEFAULT '',
            declared_size INTEGER NOT NULL DEFAULT 0,
            content_blob TEXT NOT NULL DEFAULT '',
            source_serial TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL
        );
    "#),
    ("TABLE_COMPARISON_PHOTOS", r#"
        CREATE TABLE IF NOT EXISTS comparison_photos (
            pin TEXT NOT NULL,
            bio_type INTEGER NOT NULL,
            file_name TEXT NOT NULL DEFAULT '',
            declared_size INTEGER NOT NULL DEFAULT 0,
            content_blob TEXT NOT NULL DEFAULT '',
            source_serial TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL,
            PRIMARY KEY (pin, bio_type)
        );
    "#),
    ("TABLE_WORK_CODES", r#"
        CREATE TABLE IF NOT EXISTS work_codes (
            pin TEXT NOT NULL DEFAULT '',
            code TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            source_serial TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (pin, code)
        );
    "#),
    ("TABLE_SHORT_MESSAGES", r#"
        CREATE TABLE IF NOT EXISTS short_messages (
            uid TEXT PRIMARY KEY,
            content TEXT NOT NULL DEFAULT '',
            tag TEXT NOT NULL DEFAULT '',
            duration_minutes TEXT NOT NULL DEFAULT '',
            start_time TEXT NOT NULL DEFAULT '',
            source_serial TEXT NOT NULL DEFAULT ''
        );
    "#),
    ("TABLE_USER_MESSAGES", r#"
        CREATE TABLE IF NOT EXISTS user_messages (
            pin TEXT NOT NULL,
            uid TEXT NOT NULL,
            source_serial TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (pin, uid)
        );
    "#),
    ("TABLE_ID_CARDS", r#"
        CREATE TABLE IF NOT EXISTS id_cards (
            id_number TEXT PRIMARY KEY,
            pin TEXT NOT NULL DEFAULT '',
            sn_number TEXT NOT NULL DEFAULT '',
            dn TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            gender TEXT NOT NULL DEFAULT '',
            nation TEXT NOT NULL DEFAULT '',
            birthday TEXT NOT NULL DEFAULT '',
            valid_info TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            additional_info TEXT NOT NULL DEFAULT '',
            issuer TEXT NOT NULL DEFAULT '',
            photo_blob TEXT NOT NULL DEFAULT '',
            fingerprint_template_1 TEXT NOT NULL DEFAULT '',
            fingerprint_template_2 TEXT NOT NULL DEFAULT '',
            reserve TEXT NOT NULL DEFAULT '',
            notice TEXT NOT NULL DEFAULT '',
            source_serial TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL
        );
    "#),
    ("TABLE_COMMANDS", r#"
        CREATE TABLE IF NOT EXISTS commands (
            identifier TEXT NOT NULL,
            device_serial TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'DATA',
            payload TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            sent_at TEXT,
            completed_at TEXT,
            result TEXT,
            retry_count INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (identifier, device_serial)
        );
    "#),
    ("TABLE_SYNC_JOURNAL", r#"
        CREATE TABLE IF NOT EXISTS sync_journal (
            entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_serial TEXT NOT NULL DEFAULT '',
            target_serial TEXT NOT NULL DEFAULT '',
            record_type TEXT NOT NULL,
            record_key TEXT NOT NULL DEFAULT '',
            action TEXT NOT NULL,
            status TEXT NOT NULL,
            detail TEXT,
            created_at TEXT NOT NULL
        );
    "#),
];

/// Mutaciones de columna para bases que nacieron en versiones previas.
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    ("DEVICE_COMM_KEY", "ALTER TABLE devices ADD COLUMN comm_key TEXT"),
    ("DEVICE_FACE_ALGORITHM", "ALTER TABLE devices ADD COLUMN face_algorithm TEXT"),
    ("DEVICE_ATTLOG_STAMP", "ALTER TABLE devices ADD COLUMN attlog_stamp TEXT"),
];

const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_COMMANDS_DISPATCH", "CREATE INDEX IF NOT EXISTS idx_commands_dispatch ON commands(device_serial, state, created_at);"),
    ("IDX_COMMANDS_STATE", "CREATE INDEX IF NOT EXISTS idx_commands_state ON commands(state, completed_at);"),
    ("IDX_TEMPLATES_PIN", "CREATE INDEX IF NOT EXISTS idx_templates_pin ON biometric_templates(pin);"),
    ("IDX_TEMPLATES_SOURCE", "CREATE INDEX IF NOT EXISTS idx_templates_source ON biometric_templates(source_serial);"),
    ("IDX_JOURNAL_CREATED", "CREATE INDEX IF NOT EXISTS idx_journal_created ON sync_journal(created_at);"),
    ("IDX_DEVICES_LAST_SEEN", "CREATE INDEX IF NOT EXISTS idx_devices_last_seen ON devices(last_seen);"),
];

/// Ejecuta la secuencia maestra de sincronización del esquema.
///
/// # Errors:
/// Retorna error si alguna tabla base falla en solidificarse.
#[instrument(skip(database_connection))]
pub async fn apply_full_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization...");

    solidify_base_tables(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Ledger level and certified.");
    Ok(())
}

async fn solidify_base_tables(db: &Connection) -> Result<()> {
    for (identifier, sql) in BASE_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => debug!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
