// ==========================================
// Sistema MES de Apontamento de Produção - Biblioteca Central
// ==========================================
// Tecnologias: Rust + SQLite
// Posicionamento: motor de progressão de fases e apontamentos
// (a camada de apresentação consome via API e fica fora deste crate)
// ==========================================

// ==========================================
// Declaração de módulos
// ==========================================

// Camada de domínio - entidades e tipos
pub mod domain;

// Camada de repositórios - acesso a dados
pub mod repository;

// Camada de motores - regras de negócio
pub mod engine;

// Camada de importação - catálogo externo (CSV)
pub mod importer;

// Camada de configuração
pub mod config;

// Infraestrutura de banco (conexão/PRAGMA unificados)
pub mod db;

// Sistema de logs
pub mod logging;

// Camada de API - interface de negócio
pub mod api;

// ==========================================
// Reexportação dos tipos centrais
// ==========================================

// Tipos de domínio
pub use domain::types::{
    ApontamentoStatus, FaseProgressoStatus, LoteStatus, MaquinaStatus, PoliticaMaquina,
};

// Entidades de domínio
pub use domain::{
    Apontamento, ChecklistItem, ChecklistResposta, Fase, FaseLote, FaseProgresso, Lote, Maquina,
    Produto, ProgressaoLote, RotaFase,
};

// Motores
pub use engine::{
    ApontamentoEngine, ElegibilidadeMaquinas, EngineError, ProgressaoEngine, QrPayload,
};

// API
pub use api::{ApiError, ApiResult, CatalogoApi, ProducaoApi};

// ==========================================
// Constantes do sistema
// ==========================================

// Versão do sistema
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Nome do sistema
pub const APP_NAME: &str = "Sistema MES de Apontamento de Produção";
