use chrono::{DateTime, Utc};
use kernel::model::project::{Project, ProjectMember};
use shared::error::{AppError, AppResult};

const HEADER: [&str; 7] = [
    "Name",
    "Description",
    "Category",
    "Supervisor Email",
    "Owner Email",
    "Created At",
    "Updated At",
];

fn email_of(member: Option<&ProjectMember>) -> &str {
    member.and_then(|m| m.user.email()).unwrap_or_default()
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Flattens projects into the fixed export columns.
pub fn projects_to_csv(projects: &[Project]) -> AppResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    let to_error = |e: csv::Error| AppError::ConversionEntityError(format!("CSV export: {e}"));

    writer.write_record(HEADER).map_err(to_error)?;
    for project in projects {
        let created_at = format_date(&project.created_at);
        let updated_at = format_date(&project.updated_at);
        writer
            .write_record([
                project.name.as_str(),
                project.description.as_str(),
                project.category.as_str(),
                email_of(project.supervisor()),
                email_of(project.owner()),
                created_at.as_str(),
                updated_at.as_str(),
            ])
            .map_err(to_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::ConversionEntityError(format!("CSV export: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::ConversionEntityError(format!("CSV export: {e}")))
}
