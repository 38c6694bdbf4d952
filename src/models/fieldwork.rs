// src/models/fieldwork.rs

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::models::building::BuildingKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum WeekDay {
    #[sqlx(rename = "Domingo")]
    #[serde(rename = "Domingo")]
    Domingo,
    #[sqlx(rename = "Segunda-feira")]
    #[serde(rename = "Segunda-feira")]
    Segunda,
    #[sqlx(rename = "Terça-feira")]
    #[serde(rename = "Terça-feira")]
    Terca,
    #[sqlx(rename = "Quarta-feira")]
    #[serde(rename = "Quarta-feira")]
    Quarta,
    #[sqlx(rename = "Quinta-feira")]
    #[serde(rename = "Quinta-feira")]
    Quinta,
    #[sqlx(rename = "Sexta-feira")]
    #[serde(rename = "Sexta-feira")]
    Sexta,
    #[sqlx(rename = "Sábado")]
    #[serde(rename = "Sábado")]
    Sabado,
}

impl WeekDay {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sun => WeekDay::Domingo,
            Weekday::Mon => WeekDay::Segunda,
            Weekday::Tue => WeekDay::Terca,
            Weekday::Wed => WeekDay::Quarta,
            Weekday::Thu => WeekDay::Quinta,
            Weekday::Fri => WeekDay::Sexta,
            Weekday::Sat => WeekDay::Sabado,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Ativo,
    Concluido,
}

// Horários são gravados como "HH:MM"
pub(crate) fn validate_hhmm(value: &str) -> Result<(), ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| {
            let mut err = ValidationError::new("horario");
            err.message = Some("Use o formato HH:MM.".into());
            err
        })
}

// --- 1. Saída de campo ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Outing {
    pub id: i64,
    pub nome: String,
    pub data: NaiveDate,
    pub dia_semana: WeekDay,
    pub horario: String,
    pub dirigente: Option<String>,
    pub data_criacao: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOuting {
    #[validate(length(min = 1, max = 120, message = "O nome da saída é obrigatório."))]
    pub nome: String,
    pub data: NaiveDate,
    pub dia_semana: WeekDay,
    #[validate(custom(function = "validate_hhmm"))]
    pub horario: String,
    pub dirigente: Option<String>,
}

// --- 2. Designação de território ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub territorio_id: i64,
    pub saida_campo_id: i64,
    pub data_designacao: NaiveDate,
    pub data_devolucao: Option<NaiveDate>,
    pub responsavel: Option<String>,
    pub status: AssignmentStatus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub designacao: Assignment,
    pub territorio_nome: String,
    pub saida_nome: String,
    pub dia_semana: WeekDay,
    pub horario: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_assignment_dates"))]
pub struct NewAssignment {
    pub territorio_id: i64,
    pub saida_campo_id: i64,
    pub data_designacao: NaiveDate,
    pub data_devolucao: Option<NaiveDate>,
    pub responsavel: Option<String>,
}

fn validate_assignment_dates(payload: &NewAssignment) -> Result<(), ValidationError> {
    check_return_date(payload.data_designacao, payload.data_devolucao)
}

fn check_return_date(inicio: NaiveDate, devolucao: Option<NaiveDate>) -> Result<(), ValidationError> {
    match devolucao {
        Some(fim) if fim < inicio => {
            let mut err = ValidationError::new("data_devolucao");
            err.message = Some("A devolução não pode ser anterior à designação.".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

// --- 3. Designação de prédio/vila ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BuildingAssignment {
    pub id: i64,
    pub imovel_id: i64,
    pub responsavel: String,
    pub saida_campo_id: i64,
    pub data_designacao: NaiveDate,
    pub data_devolucao: Option<NaiveDate>,
    pub status: AssignmentStatus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BuildingAssignmentDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub designacao: BuildingAssignment,
    pub imovel_numero: String,
    pub imovel_nome: Option<String>,
    pub imovel_tipo: BuildingKind,
    pub saida_nome: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_building_assignment_dates"))]
pub struct NewBuildingAssignment {
    pub imovel_id: i64,
    #[validate(length(min = 1, max = 120, message = "O responsável é obrigatório."))]
    pub responsavel: String,
    pub saida_campo_id: i64,
    pub data_designacao: NaiveDate,
    pub data_devolucao: Option<NaiveDate>,
}

fn validate_building_assignment_dates(payload: &NewBuildingAssignment) -> Result<(), ValidationError> {
    check_return_date(payload.data_designacao, payload.data_devolucao)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dia_da_semana_a_partir_da_data() {
        let terca = NaiveDate::from_ymd_opt(2026, 10, 13).unwrap();
        assert_eq!(WeekDay::of(terca), WeekDay::Terca);
    }

    #[test]
    fn horario_precisa_de_hh_mm() {
        assert!(validate_hhmm("19:30").is_ok());
        assert!(validate_hhmm("25:00").is_err());
        assert!(validate_hhmm("manhã").is_err());
    }

    #[test]
    fn devolucao_antes_da_designacao_e_rejeitada() {
        let payload = NewAssignment {
            territorio_id: 1,
            saida_campo_id: 1,
            data_designacao: NaiveDate::from_ymd_opt(2026, 10, 10).unwrap(),
            data_devolucao: NaiveDate::from_ymd_opt(2026, 10, 1),
            responsavel: None,
        };
        assert!(payload.validate().is_err());
    }
}
