// ==========================================
// Sistema MES - Camada de API
// ==========================================
// Fachadas síncronas/assíncronas sobre repositórios e motores:
// - CatalogoApi: cadastros mestres e criação de lotes
// - ProducaoApi: apontamentos no chão de fábrica
// ==========================================

pub mod catalogo_api;
pub mod error;
pub mod producao_api;

pub use catalogo_api::CatalogoApi;
pub use error::{ApiError, ApiResult};
pub use producao_api::{
    FaseProgressoDetalhe, ItemComResposta, ProducaoApi, ProgressaoDetalhada,
};
