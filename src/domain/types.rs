// ==========================================
// Sistema MES - Tipos de domínio
// ==========================================
// Formato de serialização: SCREAMING_SNAKE_CASE (igual ao banco)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// Status do lote
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoteStatus {
    Pendente,   // criado, sem apontamento
    EmProducao, // ao menos uma fase iniciada
    EmPausa,    // pausado pela supervisão
    Concluido,  // todas as fases finalizadas
    Cancelado,  // encerrado sem conclusão
}

impl fmt::Display for LoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoteStatus::Pendente => write!(f, "PENDENTE"),
            LoteStatus::EmProducao => write!(f, "EM_PRODUCAO"),
            LoteStatus::EmPausa => write!(f, "EM_PAUSA"),
            LoteStatus::Concluido => write!(f, "CONCLUIDO"),
            LoteStatus::Cancelado => write!(f, "CANCELADO"),
        }
    }
}

impl FromStr for LoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDENTE" => Ok(LoteStatus::Pendente),
            "EM_PRODUCAO" => Ok(LoteStatus::EmProducao),
            "EM_PAUSA" => Ok(LoteStatus::EmPausa),
            "CONCLUIDO" => Ok(LoteStatus::Concluido),
            "CANCELADO" => Ok(LoteStatus::Cancelado),
            other => Err(format!("status de lote desconhecido: {}", other)),
        }
    }
}

// ==========================================
// Status do apontamento
// ==========================================
// Máquina de estados: (nenhum) -> INICIADO -> FINALIZADO
// FINALIZADO é terminal por apontamento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApontamentoStatus {
    Iniciado,
    Finalizado,
}

impl fmt::Display for ApontamentoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApontamentoStatus::Iniciado => write!(f, "INICIADO"),
            ApontamentoStatus::Finalizado => write!(f, "FINALIZADO"),
        }
    }
}

impl FromStr for ApontamentoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INICIADO" => Ok(ApontamentoStatus::Iniciado),
            "FINALIZADO" => Ok(ApontamentoStatus::Finalizado),
            other => Err(format!("status de apontamento desconhecido: {}", other)),
        }
    }
}

// ==========================================
// Status de progresso de uma fase do lote
// ==========================================
// Visão derivada: calculada a partir dos apontamentos, nunca armazenada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaseProgressoStatus {
    NaoIniciada,
    EmAndamento,
    Concluida,
}

impl fmt::Display for FaseProgressoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaseProgressoStatus::NaoIniciada => write!(f, "NAO_INICIADA"),
            FaseProgressoStatus::EmAndamento => write!(f, "EM_ANDAMENTO"),
            FaseProgressoStatus::Concluida => write!(f, "CONCLUIDA"),
        }
    }
}

// ==========================================
// Status da máquina
// ==========================================
// Somente máquinas ATIVA são elegíveis para apontamento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaquinaStatus {
    Ativa,
    Inativa,
    Manutencao,
}

impl fmt::Display for MaquinaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaquinaStatus::Ativa => write!(f, "ATIVA"),
            MaquinaStatus::Inativa => write!(f, "INATIVA"),
            MaquinaStatus::Manutencao => write!(f, "MANUTENCAO"),
        }
    }
}

impl FromStr for MaquinaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ATIVA" => Ok(MaquinaStatus::Ativa),
            "INATIVA" => Ok(MaquinaStatus::Inativa),
            "MANUTENCAO" => Ok(MaquinaStatus::Manutencao),
            other => Err(format!("status de máquina desconhecido: {}", other)),
        }
    }
}

// ==========================================
// Política de seleção de máquina
// ==========================================
// OPCIONAL: a lista de máquinas da fase é apenas sugestiva
// OBRIGATORIA: iniciar apontamento em fase com máquinas ativas exige maquina_id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoliticaMaquina {
    Opcional,
    Obrigatoria,
}

impl Default for PoliticaMaquina {
    fn default() -> Self {
        PoliticaMaquina::Opcional
    }
}

impl fmt::Display for PoliticaMaquina {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoliticaMaquina::Opcional => write!(f, "OPCIONAL"),
            PoliticaMaquina::Obrigatoria => write!(f, "OBRIGATORIA"),
        }
    }
}

impl FromStr for PoliticaMaquina {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPCIONAL" => Ok(PoliticaMaquina::Opcional),
            "OBRIGATORIA" => Ok(PoliticaMaquina::Obrigatoria),
            other => Err(format!("política de máquina desconhecida: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lote_status_roundtrip() {
        for status in [
            LoteStatus::Pendente,
            LoteStatus::EmProducao,
            LoteStatus::EmPausa,
            LoteStatus::Concluido,
            LoteStatus::Cancelado,
        ] {
            assert_eq!(status.to_string().parse::<LoteStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_apontamento_status_parse() {
        assert_eq!(
            "INICIADO".parse::<ApontamentoStatus>().unwrap(),
            ApontamentoStatus::Iniciado
        );
        assert!("PAUSADO".parse::<ApontamentoStatus>().is_err());
    }

    #[test]
    fn test_politica_maquina_padrao() {
        assert_eq!(PoliticaMaquina::default(), PoliticaMaquina::Opcional);
    }
}
