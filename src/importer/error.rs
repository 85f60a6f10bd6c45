// ==========================================
// Sistema MES - Erros do módulo de importação
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== arquivo =====
    #[error("arquivo não encontrado: {0}")]
    ArquivoNaoEncontrado(String),

    #[error("formato não suportado: {0} (apenas .csv)")]
    FormatoNaoSuportado(String),

    #[error("falha na leitura do CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("falha de E/S: {0}")]
    IoError(#[from] std::io::Error),

    // ===== dados =====
    #[error("linha {linha}: {motivo}")]
    LinhaInvalida { linha: usize, motivo: String },

    // ===== persistência =====
    #[error(transparent)]
    Repositorio(#[from] RepositoryError),
}

pub type ImportResult<T> = Result<T, ImportError>;
