//! In-memory registry store for tests and local demos.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::auth::{hash_password, PasswordError};
use crate::database::models::{
    LookupItem, Page, Patient, PatientInput, PatientQuery, PatientSummary, UserProfile, UserRecord,
};
use crate::database::{DatabaseError, LookupStore, PatientStore, RegistryStore, UserStore};

/// bcrypt cost used for seeded accounts; low to keep tests fast.
pub const TEST_BCRYPT_COST: u32 = 4;

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<UserRecord>,
    patients: Vec<Patient>,
    document_types: Vec<LookupItem>,
    genders: Vec<LookupItem>,
    departments: Vec<LookupItem>,
    // (departamento_id, municipality)
    municipalities: Vec<(i64, LookupItem)>,
    next_patient_id: i64,
}

#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the standard reference data seeded.
    pub fn new() -> Self {
        let state = MemoryState {
            document_types: vec![
                LookupItem::new(1, "Cédula de Ciudadanía"),
                LookupItem::new(2, "Tarjeta de Identidad"),
                LookupItem::new(3, "Cédula de Extranjería"),
                LookupItem::new(4, "Pasaporte"),
            ],
            genders: vec![
                LookupItem::new(1, "Masculino"),
                LookupItem::new(2, "Femenino"),
                LookupItem::new(3, "Otro"),
            ],
            departments: vec![
                LookupItem::new(1, "Antioquia"),
                LookupItem::new(2, "Cundinamarca"),
                LookupItem::new(3, "Valle del Cauca"),
            ],
            municipalities: vec![
                (1, LookupItem::new(1, "Medellín")),
                (1, LookupItem::new(2, "Envigado")),
                (2, LookupItem::new(3, "Soacha")),
                (2, LookupItem::new(4, "Zipaquirá")),
                (3, LookupItem::new(5, "Cali")),
                (3, LookupItem::new(6, "Palmira")),
            ],
            next_patient_id: 1,
            ..Default::default()
        };

        Self {
            state: RwLock::new(state),
        }
    }

    /// Adds an account whose password is bcrypt-hashed at [`TEST_BCRYPT_COST`].
    pub fn with_user(self, username: &str, password: &str, role: &str, is_active: bool) -> Result<Self, PasswordError> {
        let password_hash = hash_password(password, TEST_BCRYPT_COST)?;
        if let Ok(mut state) = self.state.write() {
            let id = state.users.len() as i64 + 1;
            state.users.push(UserRecord {
                id,
                username: username.to_string(),
                email: Some(format!("{}@hospital.local", username)),
                password_hash,
                role: role.to_string(),
                is_active,
            });
        }
        Ok(self)
    }

    pub fn with_patient(self, input: PatientInput) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.insert_patient(&input);
        }
        self
    }

    pub fn patient_count(&self) -> usize {
        self.state.read().map(|state| state.patients.len()).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, DatabaseError> {
        self.state
            .read()
            .map_err(|_| DatabaseError::QueryError("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, DatabaseError> {
        self.state
            .write()
            .map_err(|_| DatabaseError::QueryError("memory store lock poisoned".to_string()))
    }
}

impl MemoryState {
    fn name_of(items: &[LookupItem], id: i64) -> Option<String> {
        items.iter().find(|item| item.id == id).map(|item| item.nombre.clone())
    }

    fn municipality_name(&self, id: i64) -> Option<String> {
        self.municipalities
            .iter()
            .find(|(_, item)| item.id == id)
            .map(|(_, item)| item.nombre.clone())
    }

    /// Copies the writable fields and refreshes the joined reference names.
    fn apply(&self, patient: &mut Patient, input: &PatientInput) {
        patient.tipo_documento_id = input.tipo_documento_id;
        patient.numero_documento = input.numero_documento.clone();
        patient.nombre1 = input.nombre1.clone();
        patient.nombre2 = input.nombre2.clone();
        patient.apellido1 = input.apellido1.clone();
        patient.apellido2 = input.apellido2.clone();
        patient.genero_id = input.genero_id;
        patient.departamento_id = input.departamento_id;
        patient.municipio_id = input.municipio_id;
        patient.correo = input.correo.clone();
        patient.telefono = input.telefono.clone();
        patient.fecha_nacimiento = input.fecha_nacimiento;
        patient.direccion = input.direccion.clone();
        patient.estado = input.estado.clone();
        patient.tipo_documento = Self::name_of(&self.document_types, input.tipo_documento_id);
        patient.genero = Self::name_of(&self.genders, input.genero_id);
        patient.departamento = Self::name_of(&self.departments, input.departamento_id);
        patient.municipio = self.municipality_name(input.municipio_id);
    }

    fn insert_patient(&mut self, input: &PatientInput) -> i64 {
        let id = self.next_patient_id;
        self.next_patient_id += 1;

        // Later inserts sort as newer even within the same clock tick.
        let now = Utc::now() + Duration::microseconds(id);
        let mut patient = Patient {
            id,
            tipo_documento_id: 0,
            numero_documento: String::new(),
            nombre1: String::new(),
            nombre2: None,
            apellido1: String::new(),
            apellido2: None,
            genero_id: 0,
            departamento_id: 0,
            municipio_id: 0,
            correo: None,
            telefono: None,
            fecha_nacimiento: None,
            direccion: None,
            estado: String::new(),
            created_at: now,
            updated_at: now,
            tipo_documento: None,
            genero: None,
            departamento: None,
            municipio: None,
        };
        self.apply(&mut patient, input);
        self.patients.push(patient);
        id
    }
}

fn matches_search(patient: &Patient, needle: &str) -> bool {
    let fields = [
        Some(&patient.nombre1),
        patient.nombre2.as_ref(),
        Some(&patient.apellido1),
        patient.apellido2.as_ref(),
        patient.correo.as_ref(),
        Some(&patient.numero_documento),
    ];
    fields
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(needle))
}

fn sorted_by_name(mut items: Vec<LookupItem>) -> Vec<LookupItem> {
    items.sort_by(|a, b| a.nombre.cmp(&b.nombre));
    items
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn list_patients(&self, query: &PatientQuery) -> Result<Page<PatientSummary>, DatabaseError> {
        let state = self.read()?;
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut matching: Vec<&Patient> = state
            .patients
            .iter()
            .filter(|p| needle.as_deref().map_or(true, |n| matches_search(p, n)))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(query.offset().max(0) as usize)
            .take(query.limit.max(0) as usize)
            .map(Patient::summary)
            .collect();

        Ok(Page {
            items,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn find_patient(&self, id: i64) -> Result<Option<Patient>, DatabaseError> {
        let state = self.read()?;
        Ok(state.patients.iter().find(|p| p.id == id).cloned())
    }

    async fn document_exists(&self, numero_documento: &str, exclude_id: Option<i64>) -> Result<bool, DatabaseError> {
        let state = self.read()?;
        Ok(state
            .patients
            .iter()
            .any(|p| p.numero_documento == numero_documento && Some(p.id) != exclude_id))
    }

    async fn create_patient(&self, input: &PatientInput) -> Result<i64, DatabaseError> {
        let mut state = self.write()?;
        Ok(state.insert_patient(input))
    }

    async fn update_patient(&self, id: i64, input: &PatientInput) -> Result<bool, DatabaseError> {
        let mut state = self.write()?;
        let Some(index) = state.patients.iter().position(|p| p.id == id) else {
            return Ok(false);
        };

        let mut patient = state.patients[index].clone();
        state.apply(&mut patient, input);
        patient.updated_at = Utc::now();
        state.patients[index] = patient;
        Ok(true)
    }

    async fn delete_patient(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut state = self.write()?;
        let before = state.patients.len();
        state.patients.retain(|p| p.id != id);
        Ok(state.patients.len() < before)
    }
}

#[async_trait]
impl LookupStore for MemoryStore {
    async fn document_types(&self) -> Result<Vec<LookupItem>, DatabaseError> {
        Ok(sorted_by_name(self.read()?.document_types.clone()))
    }

    async fn genders(&self) -> Result<Vec<LookupItem>, DatabaseError> {
        Ok(sorted_by_name(self.read()?.genders.clone()))
    }

    async fn departments(&self) -> Result<Vec<LookupItem>, DatabaseError> {
        Ok(sorted_by_name(self.read()?.departments.clone()))
    }

    async fn municipalities(&self, departamento_id: i64) -> Result<Vec<LookupItem>, DatabaseError> {
        let state = self.read()?;
        let items = state
            .municipalities
            .iter()
            .filter(|(department, _)| *department == departamento_id)
            .map(|(_, item)| item.clone())
            .collect();
        Ok(sorted_by_name(items))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let state = self.read()?;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_profile(&self, id: i64) -> Result<Option<UserProfile>, DatabaseError> {
        let state = self.read()?;
        Ok(state.users.iter().find(|u| u.id == id).map(UserRecord::profile))
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.read().map(|_| ())
    }
}

/// A patient input that passes every patient rule.
pub fn sample_patient(numero_documento: &str, nombre1: &str, apellido1: &str) -> PatientInput {
    PatientInput {
        tipo_documento_id: 1,
        numero_documento: numero_documento.to_string(),
        nombre1: nombre1.to_string(),
        nombre2: None,
        apellido1: apellido1.to_string(),
        apellido2: None,
        genero_id: 2,
        departamento_id: 1,
        municipio_id: 1,
        correo: None,
        telefono: None,
        fecha_nacimiento: None,
        direccion: None,
        estado: crate::database::models::DEFAULT_ESTADO.to_string(),
    }
}
