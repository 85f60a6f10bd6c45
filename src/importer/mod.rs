// ==========================================
// Sistema MES - Módulo de importação
// ==========================================
// Carga de catálogo a partir de CSV (produtos, fases, checklist,
// máquinas e rotas)
// ==========================================

pub mod catalogo_importer;
pub mod error;

pub use catalogo_importer::{CatalogoImporter, RejeicaoLinha, ResumoImportacao};
pub use error::{ImportError, ImportResult};
