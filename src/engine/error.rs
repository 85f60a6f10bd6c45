// ==========================================
// Sistema MES - Erros dos motores
// ==========================================
// Toda regra violada produz um erro estruturado com o motivo
// explícito; nenhum erro é engolido ou repetido automaticamente
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("registro não encontrado: {entidade} com id={id}")]
    NaoEncontrado { entidade: String, id: i64 },

    #[error("operação ilegal para o estado atual: apontamento {apontamento_id} está {status}")]
    EstadoInvalido {
        apontamento_id: i64,
        status: String,
    },

    #[error("lote {lote_id} indisponível para apontamento: está {status}")]
    LoteIndisponivel { lote_id: i64, status: String },

    #[error("fase {fase_id} fora de ordem: a fase {fase_pendente} ainda não foi concluída")]
    FaseForaDeOrdem { fase_id: i64, fase_pendente: i64 },

    #[error("fase {fase_id} do lote {lote_id} já está em execução pelo operador {operador_id}")]
    FaseOcupada {
        lote_id: i64,
        fase_id: i64,
        operador_id: i64,
    },

    #[error("operador {operador_id} já possui apontamento aberto (id={apontamento_id})")]
    OperadorOcupado {
        operador_id: i64,
        apontamento_id: i64,
    },

    #[error("checklist incompleto: {} item(ns) obrigatório(s) sem conclusão", itens_pendentes.len())]
    ChecklistIncompleto {
        apontamento_id: i64,
        itens_pendentes: Vec<String>,
    },

    #[error("a fase {fase_id} exige seleção de máquina")]
    MaquinaObrigatoria { fase_id: i64 },

    #[error("máquina {maquina_id} não é elegível para a fase {fase_id}")]
    MaquinaInelegivel { maquina_id: i64, fase_id: i64 },

    #[error("item {item_id} não pertence ao checklist da fase {fase_id}")]
    ChecklistItemForaDaFase { item_id: i64, fase_id: i64 },

    #[error("lote {lote_id} não possui fases: rota vazia é erro de configuração")]
    RotaVazia { lote_id: i64 },

    #[error(transparent)]
    Repositorio(#[from] RepositoryError),

    #[error(transparent)]
    Outro(#[from] anyhow::Error),
}

/// Alias de Result dos motores
pub type EngineResult<T> = Result<T, EngineError>;
