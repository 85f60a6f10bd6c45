// ==========================================
// Sistema MES - Camada de configuração
// ==========================================
// Configuração operacional persistida no banco (chave/valor),
// lida pelos motores através do trait ConfigReader
// ==========================================

pub mod config_manager;
pub mod config_reader;

pub use config_manager::ConfigManager;
pub use config_reader::{ConfigEstatica, ConfigReader, CHAVE_POLITICA_MAQUINA};
