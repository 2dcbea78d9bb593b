use crate::analysis::successors::{resolve_origin, score_successors};
use crate::commands::db;
use crate::commands::scoring::{load_scoring_inputs, today};
use crate::commands::settings::load_effective_settings;
use crate::error::EngineResult;
use crate::models::score::SuccessorView;
use chrono::NaiveDate;

/// Direct successors of an issue, scored and ranked as their own batch.
/// `reference` may be an external ticket number or an internal id.
pub async fn get_successors(data_dir: String, reference: i64) -> EngineResult<SuccessorView> {
    get_successors_internal(&data_dir, reference, today()).await
}

pub async fn get_successors_internal(
    data_dir: &str,
    reference: i64,
    today: NaiveDate,
) -> EngineResult<SuccessorView> {
    let settings = load_effective_settings(data_dir)?;
    let origin = {
        let conn = db::get_db_connection(data_dir)?;
        resolve_origin(&conn, reference)?
    };
    log::debug!("resolved successor origin {reference} to issue {}", origin.id);

    let inputs = load_scoring_inputs(data_dir).await?;

    let conn = db::get_db_connection(data_dir)?;
    let view = score_successors(
        &conn,
        origin,
        &inputs,
        today,
        &settings.score_bands,
        &settings.date_format,
    )?;

    log::info!(
        "issue {} has {} successors ({} completed)",
        view.origin.id,
        view.linked_count,
        view.completed_count
    );
    Ok(view)
}
