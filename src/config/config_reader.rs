// ==========================================
// Sistema MES - Trait de leitura de configuração
// ==========================================
// Os motores dependem deste trait, não do gerenciador concreto
// ==========================================

use crate::domain::types::PoliticaMaquina;
use async_trait::async_trait;
use std::collections::HashMap;
use std::str::FromStr;

/// Chave da política de seleção de máquina
pub const CHAVE_POLITICA_MAQUINA: &str = "politica_maquina";

/// Leitura de configuração operacional
#[async_trait]
pub trait ConfigReader: Send + Sync {
    /// Valor bruto de uma chave, se definida
    async fn obter(&self, chave: &str) -> anyhow::Result<Option<String>>;

    /// Política de seleção de máquina (padrão: OPCIONAL)
    async fn politica_maquina(&self) -> anyhow::Result<PoliticaMaquina> {
        match self.obter(CHAVE_POLITICA_MAQUINA).await? {
            Some(valor) => PoliticaMaquina::from_str(&valor)
                .map_err(|e| anyhow::anyhow!("configuração inválida: {}", e)),
            None => Ok(PoliticaMaquina::default()),
        }
    }
}

// ==========================================
// ConfigEstatica - configuração em memória
// ==========================================
// Para testes e para cenários sem banco de configuração
#[derive(Debug, Default)]
pub struct ConfigEstatica {
    valores: HashMap<String, String>,
}

impl ConfigEstatica {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn com(mut self, chave: &str, valor: &str) -> Self {
        self.valores.insert(chave.to_string(), valor.to_string());
        self
    }

    pub fn com_politica_maquina(self, politica: PoliticaMaquina) -> Self {
        self.com(CHAVE_POLITICA_MAQUINA, &politica.to_string())
    }
}

#[async_trait]
impl ConfigReader for ConfigEstatica {
    async fn obter(&self, chave: &str) -> anyhow::Result<Option<String>> {
        Ok(self.valores.get(chave).cloned())
    }
}
