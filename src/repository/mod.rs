// ==========================================
// Sistema MES - Camada de repositórios
// ==========================================
// Responsabilidade: acesso a dados (SQLite)
// Cada repositório garante o próprio schema em ensure_table()
// ==========================================

pub mod apontamento_repo;
pub mod error;
pub mod fase_repo;
pub mod lote_repo;
pub mod maquina_repo;
pub mod produto_repo;

pub use apontamento_repo::ApontamentoRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use fase_repo::FaseRepository;
pub use lote_repo::LoteRepository;
pub use maquina_repo::MaquinaRepository;
pub use produto_repo::{ProdutoRepository, RotaInvalidaDetalhe};
