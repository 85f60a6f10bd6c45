// ==========================================
// Sistema MES - Máquina
// ==========================================
// Máquinas são associadas (ordenadas) a uma fase.
// A ordem define preferência de uso, não exclusividade:
// qualquer máquina ATIVA da fase é elegível.
// ==========================================

use crate::domain::types::MaquinaStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maquina {
    pub id: i64,
    pub codigo: String,
    pub nome: String,
    pub fase_id: i64,
    pub ordem: i64,
    pub status: MaquinaStatus,
    /// Conteúdo do QR code afixado na máquina (formato "maquina:{codigo}")
    pub qrcode: Option<String>,
}

impl Maquina {
    pub fn esta_ativa(&self) -> bool {
        self.status == MaquinaStatus::Ativa
    }
}
