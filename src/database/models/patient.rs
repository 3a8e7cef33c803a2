use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

pub const DEFAULT_ESTADO: &str = "activo";

/// Row of the paginated patient listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PatientSummary {
    pub id: i64,
    pub numero_documento: String,
    pub nombre1: String,
    pub nombre2: Option<String>,
    pub apellido1: String,
    pub apellido2: Option<String>,
    pub correo: Option<String>,
    pub telefono: Option<String>,
    pub estado: String,
    pub created_at: DateTime<Utc>,
    pub tipo_documento: Option<String>,
    pub genero: Option<String>,
    pub departamento: Option<String>,
    pub municipio: Option<String>,
}

/// Full patient record with the names of its reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Patient {
    pub id: i64,
    pub tipo_documento_id: i64,
    pub numero_documento: String,
    pub nombre1: String,
    pub nombre2: Option<String>,
    pub apellido1: String,
    pub apellido2: Option<String>,
    pub genero_id: i64,
    pub departamento_id: i64,
    pub municipio_id: i64,
    pub correo: Option<String>,
    pub telefono: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub direccion: Option<String>,
    pub estado: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tipo_documento: Option<String>,
    pub genero: Option<String>,
    pub departamento: Option<String>,
    pub municipio: Option<String>,
}

impl Patient {
    pub fn summary(&self) -> PatientSummary {
        PatientSummary {
            id: self.id,
            numero_documento: self.numero_documento.clone(),
            nombre1: self.nombre1.clone(),
            nombre2: self.nombre2.clone(),
            apellido1: self.apellido1.clone(),
            apellido2: self.apellido2.clone(),
            correo: self.correo.clone(),
            telefono: self.telefono.clone(),
            estado: self.estado.clone(),
            created_at: self.created_at,
            tipo_documento: self.tipo_documento.clone(),
            genero: self.genero.clone(),
            departamento: self.departamento.clone(),
            municipio: self.municipio.clone(),
        }
    }
}

/// Writable patient fields, built from a validated and sanitized request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientInput {
    pub tipo_documento_id: i64,
    pub numero_documento: String,
    pub nombre1: String,
    pub nombre2: Option<String>,
    pub apellido1: String,
    pub apellido2: Option<String>,
    pub genero_id: i64,
    pub departamento_id: i64,
    pub municipio_id: i64,
    pub correo: Option<String>,
    pub telefono: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub direccion: Option<String>,
    pub estado: String,
}

impl PatientInput {
    /// Reads a record that already passed the patient rules. Identifier fields
    /// may arrive as JSON numbers or numeric strings; empty optionals become `None`.
    pub fn from_record(record: &Map<String, Value>) -> Result<Self, String> {
        Ok(Self {
            tipo_documento_id: id_field(record, "tipo_documento_id")?,
            numero_documento: text_field(record, "numero_documento")?,
            nombre1: text_field(record, "nombre1")?,
            nombre2: optional_text(record, "nombre2"),
            apellido1: text_field(record, "apellido1")?,
            apellido2: optional_text(record, "apellido2"),
            genero_id: id_field(record, "genero_id")?,
            departamento_id: id_field(record, "departamento_id")?,
            municipio_id: id_field(record, "municipio_id")?,
            correo: optional_text(record, "correo"),
            telefono: optional_text(record, "telefono"),
            fecha_nacimiento: optional_text(record, "fecha_nacimiento")
                .map(|text| {
                    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                        .map_err(|_| "fecha_nacimiento must be a valid date (YYYY-MM-DD)".to_string())
                })
                .transpose()?,
            direccion: optional_text(record, "direccion"),
            estado: optional_text(record, "estado").unwrap_or_else(|| DEFAULT_ESTADO.to_string()),
        })
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_field(record: &Map<String, Value>, field: &str) -> Result<i64, String> {
    let value = record.get(field).unwrap_or(&Value::Null);
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| format!("{} must be an integer identifier", field))
}

fn text_field(record: &Map<String, Value>, field: &str) -> Result<String, String> {
    record
        .get(field)
        .and_then(scalar_text)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| format!("{} is required", field))
}

fn optional_text(record: &Map<String, Value>, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(scalar_text)
        .filter(|text| !text.is_empty())
}

/// Listing parameters after defaults and clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientQuery {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
}

impl PatientQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// One page of results plus the total across all pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn pages(&self) -> i64 {
        if self.limit <= 0 {
            return 0;
        }
        (self.total + self.limit - 1) / self.limit
    }
}
