use actix_files::Files;
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::calendar::{build_cells, Calendar};
use crate::display::calendar_csv_bytes;
use crate::error::ConvertResult;
use crate::parser::parse_survey;
use crate::reconcile::{reconcile, ChangeEntry, ReconcileOptions, ReconcilePolicy};
use crate::report::{duplicate_aliases, slot_counts, DoctorCount, DuplicateAlias};

/// Everything derived from one uploaded file. Replaced wholesale on the
/// next upload; nothing survives across uploads.
#[derive(Debug)]
pub struct ProcessedSurvey {
    pub calendar: Calendar,
    pub counts: Vec<DoctorCount>,
    pub changes: Vec<ChangeEntry>,
    pub duplicates: Vec<DuplicateAlias>,
}

// In-memory storage for the last processed survey (in production, use a database)
pub struct AppState {
    pub survey: Mutex<Option<ProcessedSurvey>>,
    pub admin_password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
pub struct UploadParams {
    /// "union" (default) or "latest-wins".
    policy: Option<String>,
    include_unchanged: Option<bool>,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    days: Vec<u32>,
    slots: Vec<String>,
    rows: Vec<CalendarRow>,
}

#[derive(Serialize)]
pub struct CalendarRow {
    day: u32,
    cells: Vec<String>,
}

#[derive(Serialize)]
pub struct ReportResponse {
    counts: Vec<DoctorCount>,
    duplicates: Vec<DuplicateAlias>,
}

/// Runs the full conversion pipeline on one uploaded CSV body.
pub fn process_csv(body: &[u8], options: ReconcileOptions) -> ConvertResult<ProcessedSurvey> {
    let (responses, identity) = parse_survey(body)?;
    let (entries, changes) = reconcile(responses, identity, options);
    let cells = build_cells(&entries);
    let counts = slot_counts(&cells);
    let duplicates = duplicate_aliases(&entries);
    let calendar = Calendar::build(cells);

    Ok(ProcessedSurvey {
        calendar,
        counts,
        changes,
        duplicates,
    })
}

// Admin login endpoint
async fn admin_login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.password == state.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::Unauthorized()
            .json(serde_json::json!({"success": false, "error": "Invalid password"})))
    }
}

// Admin CSV upload endpoint: parses and reconciles the whole file in one pass
async fn admin_upload(
    req: HttpRequest,
    params: web::Query<UploadParams>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    // Check password from header
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if password != state.admin_password {
        return Ok(HttpResponse::Unauthorized()
            .json(serde_json::json!({"success": false, "error": "Unauthorized"})));
    }

    let policy = match params.policy.as_deref() {
        Some("latest-wins") => ReconcilePolicy::LatestWins,
        _ => ReconcilePolicy::Union,
    };
    let options = ReconcileOptions {
        policy,
        include_unchanged: params.include_unchanged.unwrap_or(false),
    };

    match process_csv(&body, options) {
        Ok(survey) => {
            let doctors = survey.counts.len();
            *state.survey.lock().unwrap() = Some(survey);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": format!("Conversione completata: {} medici", doctors)
            })))
        }
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to process CSV: {}", e)
        }))),
    }
}

// Calendar endpoint: the dense day x slot grid
async fn get_calendar(state: web::Data<AppState>) -> Result<HttpResponse> {
    let survey = state.survey.lock().unwrap();

    if let Some(ref survey) = *survey {
        let calendar = &survey.calendar;
        let rows = calendar
            .days
            .iter()
            .map(|&day| CalendarRow {
                day,
                cells: calendar
                    .slots
                    .iter()
                    .map(|slot| calendar.cell(day, slot))
                    .collect(),
            })
            .collect();

        Ok(HttpResponse::Ok().json(CalendarResponse {
            days: calendar.days.clone(),
            slots: calendar.slots.clone(),
            rows,
        }))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No data available"})))
    }
}

// Report endpoint: slot counts plus duplicate aliases
async fn get_report(state: web::Data<AppState>) -> Result<HttpResponse> {
    let survey = state.survey.lock().unwrap();

    if let Some(ref survey) = *survey {
        Ok(HttpResponse::Ok().json(ReportResponse {
            counts: survey.counts.clone(),
            duplicates: survey.duplicates.clone(),
        }))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No data available"})))
    }
}

// Changes endpoint: added/removed slots per doctor across responses
async fn get_changes(state: web::Data<AppState>) -> Result<HttpResponse> {
    let survey = state.survey.lock().unwrap();

    if let Some(ref survey) = *survey {
        Ok(HttpResponse::Ok().json(&survey.changes))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No data available"})))
    }
}

// Download endpoint: the converted calendar as a CSV attachment
async fn download_calendar(state: web::Data<AppState>) -> Result<HttpResponse> {
    let survey = state.survey.lock().unwrap();

    if let Some(ref survey) = *survey {
        let bytes = calendar_csv_bytes(&survey.calendar)
            .map_err(actix_web::error::ErrorInternalServerError)?;
        Ok(HttpResponse::Ok()
            .content_type("text/csv")
            .insert_header((
                "Content-Disposition",
                "attachment; filename=\"disponibilita_convertita.csv\"",
            ))
            .body(bytes))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No data available"})))
    }
}

// HTML page handler
async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

pub async fn start_server(port: u16, admin_password: String) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState {
        survey: Mutex::new(None),
        admin_password,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static").show_files_listing())
            .route("/", web::get().to(index))
            .route("/api/login", web::post().to(admin_login))
            .route("/api/upload", web::post().to(admin_upload))
            .route("/api/calendar", web::get().to(get_calendar))
            .route("/api/report", web::get().to(get_report))
            .route("/api/changes", web::get().to(get_changes))
            .route("/api/download", web::get().to(download_calendar))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Informazioni cronologiche,MEDICO: Nome e Cognome,Indirizzo email,Disponibilità  [Lunedì 2],Disponibilità  [Martedì 3]
12/05/2025 09.00.00,Mario Rossi,rossi@asl.it,Mattina,
13/05/2025 09.00.00,Mario Rossi,rossi@asl.it,\"Mattina, Pomeriggio\",Notte
12/05/2025 10.00.00,Anna Bianchi,bianchi@asl.it,,Notte
";

    #[test]
    fn upload_pipeline_latest_wins_end_to_end() {
        let options = ReconcileOptions {
            policy: ReconcilePolicy::LatestWins,
            include_unchanged: false,
        };
        let survey = process_csv(CSV.as_bytes(), options).unwrap();

        assert_eq!(survey.calendar.days, vec![2, 3]);
        assert_eq!(survey.calendar.slots, vec!["MATTINA", "POMERIGGIO", "NOTTE"]);
        assert_eq!(survey.calendar.cell(2, "MATTINA"), "Mario Rossi");
        assert_eq!(survey.calendar.cell(2, "POMERIGGIO"), "Mario Rossi");
        assert_eq!(survey.calendar.cell(3, "NOTTE"), "Anna Bianchi, Mario Rossi");

        // Rossi resubmitted with an extra slot: only additions, no removals.
        assert_eq!(survey.changes.len(), 1);
        let added: Vec<_> = survey.changes[0]
            .added
            .iter()
            .map(|k| (k.day, k.slot.as_str()))
            .collect();
        assert_eq!(added, vec![(2, "POMERIGGIO"), (3, "NOTTE")]);
        assert!(survey.changes[0].removed.is_empty());

        // Counts: Rossi holds 3 cells, Bianchi 1.
        assert_eq!(survey.counts[0].name, "Mario Rossi");
        assert_eq!(survey.counts[0].slots, 3);
        assert_eq!(survey.counts[1].slots, 1);
    }

    #[test]
    fn upload_pipeline_rejects_survey_without_identity_columns() {
        let csv = "Note,Disponibilità  [Lunedì 2]\nciao,Mattina\n";
        let err = process_csv(csv.as_bytes(), ReconcileOptions::default()).unwrap_err();
        assert!(err.to_string().contains("MEDICO"));
    }
}
