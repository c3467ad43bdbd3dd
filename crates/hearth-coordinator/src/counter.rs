// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counter queries, written once against the façade.

use serde::Deserialize;

use hearth_core::HearthError;

use crate::facade::Facade;

#[derive(Debug, Deserialize)]
struct CounterRow {
    value: i64,
}

pub async fn get_count(db: &Facade) -> Result<i64, HearthError> {
    let row: Option<CounterRow> = db
        .prepare("SELECT value FROM counter WHERE id = 1")
        .first()
        .await?;
    Ok(row.map_or(0, |r| r.value))
}

pub async fn increment(db: &Facade) -> Result<i64, HearthError> {
    let row: Option<CounterRow> = db
        .prepare("UPDATE counter SET value = value + 1 WHERE id = 1 RETURNING value")
        .first()
        .await?;
    Ok(row.map_or(0, |r| r.value))
}

pub async fn decrement(db: &Facade) -> Result<i64, HearthError> {
    let row: Option<CounterRow> = db
        .prepare("UPDATE counter SET value = value - 1 WHERE id = 1 RETURNING value")
        .first()
        .await?;
    Ok(row.map_or(0, |r| r.value))
}

pub async fn set_count(db: &Facade, value: i64) -> Result<i64, HearthError> {
    let row: Option<CounterRow> = db
        .prepare("UPDATE counter SET value = ? WHERE id = 1 RETURNING value")
        .bind([value])
        .first()
        .await?;
    Ok(row.map_or(0, |r| r.value))
}

pub async fn reset_count(db: &Facade) -> Result<(), HearthError> {
    db.prepare("UPDATE counter SET value = 0 WHERE id = 1")
        .run()
        .await?;
    Ok(())
}
