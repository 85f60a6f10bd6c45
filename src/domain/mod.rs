// ==========================================
// Sistema MES - Camada de domínio
// ==========================================
// Entidades e tipos do rastreamento de produção:
// lotes, fases, rotas, apontamentos, checklists e máquinas
// ==========================================

pub mod apontamento;
pub mod fase;
pub mod lote;
pub mod maquina;
pub mod produto;
pub mod types;

pub use apontamento::{Apontamento, ChecklistResposta};
pub use fase::{ChecklistItem, Fase};
pub use lote::{FaseLote, FaseProgresso, Lote, ProgressaoLote};
pub use maquina::Maquina;
pub use produto::{Produto, RotaFase};
