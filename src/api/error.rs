// ==========================================
// Sistema MES - Erros da camada de API
// ==========================================
// Responsabilidade: converter erros técnicos dos repositórios e
// erros dos motores em falhas estruturadas para o chamador.
// Nenhum erro é repetido automaticamente: FaseOcupada, por
// exemplo, é decisão do usuário (atualizar a tela e escolher),
// não do motor.
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use crate::repository::produto_repo::RotaInvalidaDetalhe;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // Entidades ausentes
    // ==========================================
    #[error("recurso não encontrado: {0}")]
    NaoEncontrado(String),

    // ==========================================
    // Regras do apontamento
    // ==========================================
    #[error("operação ilegal para o estado atual: {0}")]
    EstadoInvalido(String),

    #[error("lote {lote_id} indisponível para apontamento: está {status}")]
    LoteIndisponivel { lote_id: i64, status: String },

    #[error("fase {fase_id} fora de ordem: a fase {fase_pendente} ainda não foi concluída")]
    FaseForaDeOrdem { fase_id: i64, fase_pendente: i64 },

    #[error("fase {fase_id} do lote {lote_id} já em execução pelo operador {operador_id}")]
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

    #[error("checklist incompleto: {} item(ns) obrigatório(s) pendente(s)", itens_pendentes.len())]
    ChecklistIncompleto { itens_pendentes: Vec<String> },

    #[error("a fase {fase_id} exige seleção de máquina")]
    MaquinaObrigatoria { fase_id: i64 },

    #[error("máquina {maquina_id} não é elegível para a fase {fase_id}")]
    MaquinaInelegivel { maquina_id: i64, fase_id: i64 },

    #[error("item {item_id} não pertence ao checklist da fase {fase_id}")]
    ChecklistItemForaDaFase { item_id: i64, fase_id: i64 },

    // ==========================================
    // Catálogo e rotas
    // ==========================================
    #[error("rota inválida: {} violação(ões)", violacoes.len())]
    RotaInvalida { violacoes: Vec<RotaInvalidaDetalhe> },

    #[error("produto {produto_id} não possui rota definida")]
    RotaVazia { produto_id: i64 },

    #[error("entrada inválida: {0}")]
    EntradaInvalida(String),

    // ==========================================
    // Acesso a dados
    // ==========================================
    #[error("erro de banco de dados: {0}")]
    DatabaseError(String),

    #[error("erro interno: {0}")]
    Interno(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// Conversão de RepositoryError
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NaoEncontrado(format!("{} com id={}", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::EntradaInvalida(format!("registro duplicado: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::EntradaInvalida(format!("referência inexistente: {}", msg))
            }
            RepositoryError::ValidationError(msg)
            | RepositoryError::BusinessRuleViolation(msg) => ApiError::EntradaInvalida(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::EntradaInvalida(format!("{}: {}", field, message))
            }
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::LockError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::InternalError(msg) => ApiError::Interno(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

// ==========================================
// Conversão de EngineError
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NaoEncontrado { entidade, id } => {
                ApiError::NaoEncontrado(format!("{} com id={}", entidade, id))
            }
            EngineError::EstadoInvalido {
                apontamento_id,
                status,
            } => ApiError::EstadoInvalido(format!(
                "apontamento {} está {}",
                apontamento_id, status
            )),
            EngineError::LoteIndisponivel { lote_id, status } => {
                ApiError::LoteIndisponivel { lote_id, status }
            }
            EngineError::FaseForaDeOrdem {
                fase_id,
                fase_pendente,
            } => ApiError::FaseForaDeOrdem {
                fase_id,
                fase_pendente,
            },
            EngineError::FaseOcupada {
                lote_id,
                fase_id,
                operador_id,
            } => ApiError::FaseOcupada {
                lote_id,
                fase_id,
                operador_id,
            },
            EngineError::OperadorOcupado {
                operador_id,
                apontamento_id,
            } => ApiError::OperadorOcupado {
                operador_id,
                apontamento_id,
            },
            EngineError::ChecklistIncompleto {
                itens_pendentes, ..
            } => ApiError::ChecklistIncompleto { itens_pendentes },
            EngineError::MaquinaObrigatoria { fase_id } => {
                ApiError::MaquinaObrigatoria { fase_id }
            }
            EngineError::MaquinaInelegivel {
                maquina_id,
                fase_id,
            } => ApiError::MaquinaInelegivel {
                maquina_id,
                fase_id,
            },
            EngineError::ChecklistItemForaDaFase { item_id, fase_id } => {
                ApiError::ChecklistItemForaDaFase { item_id, fase_id }
            }
            EngineError::RotaVazia { lote_id } => {
                ApiError::EstadoInvalido(format!("lote {} não possui rota registrada", lote_id))
            }
            EngineError::Repositorio(e) => e.into(),
            EngineError::Outro(e) => ApiError::Other(e),
        }
    }
}

/// Alias de Result da camada
pub type ApiResult<T> = Result<T, ApiError>;
