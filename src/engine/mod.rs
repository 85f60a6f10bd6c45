// ==========================================
// Sistema MES - Camada de motores
// ==========================================
// Responsabilidade: regras de negócio da progressão e do
// apontamento. Toda regra violada sai como erro estruturado
// com motivo explícito.
// ==========================================

pub mod apontamento_engine;
pub mod elegibilidade;
pub mod error;
pub mod progressao;
pub mod qrcode;

pub use apontamento_engine::{ApontamentoEngine, ApontamentoFinalizado};
pub use elegibilidade::ElegibilidadeMaquinas;
pub use error::{EngineError, EngineResult};
pub use progressao::ProgressaoEngine;
pub use qrcode::{QrError, QrPayload};
