//! Static description of the funnel's screens.
//!
//! The screen copy and option sets live here so every binary renders the
//! same funnel; visitor progress itself is tracked in [`crate::domain`].

pub const FIRST_STEP: u32 = 1;
pub const LAST_STEP: u32 = 17;

/// Step that records the visitor's earnings goal.
pub const GOAL_STEP: u32 = 2;
/// Step that records how much the visitor is willing to invest.
pub const INVESTMENT_STEP: u32 = 8;

pub const GOAL_POINTS: u32 = 50;
pub const INVESTMENT_POINTS: u32 = 115;

/// Seconds the simulated call plays before advancing on its own.
pub const CALL_AUTO_ADVANCE_SECS: u64 = 3;

pub fn is_valid_step(step: u32) -> bool {
    (FIRST_STEP..=LAST_STEP).contains(&step)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Full-screen copy with a single continue action.
    Message,
    /// Multiple-choice question recording the visitor's goal.
    GoalQuestion,
    /// Multiple-choice question recording the visitor's investment range.
    InvestmentQuestion,
    /// Simulated voice call that advances on its own.
    VoiceCall,
    /// Recipe video episode.
    VideoEpisode,
}

#[derive(Debug, Clone, Copy)]
pub struct ChoiceOption {
    pub id: &'static str,
    pub label: &'static str,
    pub sublabel: &'static str,
}

pub static GOAL_OPTIONS: [ChoiceOption; 4] = [
    ChoiceOption {
        id: "extra",
        label: "R$500-1.000/mês",
        sublabel: "Renda extra",
    },
    ChoiceOption {
        id: "salary",
        label: "R$2.000-3.000/mês",
        sublabel: "Substituir salário",
    },
    ChoiceOption {
        id: "business",
        label: "R$5.000-10.000/mês",
        sublabel: "Negócio próprio",
    },
    ChoiceOption {
        id: "empire",
        label: "+R$10.000/mês",
        sublabel: "Império do açaí",
    },
];

pub static INVESTMENT_OPTIONS: [ChoiceOption; 4] = [
    ChoiceOption {
        id: "low",
        label: "Até R$50",
        sublabel: "Começar pequeno",
    },
    ChoiceOption {
        id: "medium",
        label: "R$50 - R$100",
        sublabel: "Investimento moderado",
    },
    ChoiceOption {
        id: "high",
        label: "R$100 - R$200",
        sublabel: "Investir para crescer",
    },
    ChoiceOption {
        id: "premium",
        label: "Acima de R$200",
        sublabel: "Negócio sério",
    },
];

#[derive(Debug, Clone, Copy)]
pub struct StepDefinition {
    pub number: u32,
    pub title: &'static str,
    pub kind: StepKind,
    /// Points awarded when this step completes.
    pub points: u32,
    /// Progress percentage shown on this screen, where the design calls for one.
    pub progress_percent: Option<u8>,
}

pub static STEPS: [StepDefinition; LAST_STEP as usize] = [
    StepDefinition {
        number: 1,
        title: "ATENÇÃO",
        kind: StepKind::Message,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 2,
        title: "Quanto você quer ganhar com açaí?",
        kind: StepKind::GoalQuestion,
        points: GOAL_POINTS,
        progress_percent: None,
    },
    StepDefinition {
        number: 3,
        title: "Destravar vendas de açaí agora...",
        kind: StepKind::Message,
        points: 50,
        progress_percent: None,
    },
    StepDefinition {
        number: 4,
        title: "Confeitaria Andreia",
        kind: StepKind::Message,
        points: 50,
        progress_percent: None,
    },
    StepDefinition {
        number: 5,
        title: "Chamada de áudio...",
        kind: StepKind::Message,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 6,
        title: "Açaí na Garrafa — Do ZERO a R$5.000/mês",
        kind: StepKind::Message,
        points: 50,
        progress_percent: None,
    },
    StepDefinition {
        number: 7,
        title: "Em chamada com @andreia.conf",
        kind: StepKind::VoiceCall,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 8,
        title: "Quanto você está disposto a investir?",
        kind: StepKind::InvestmentQuestion,
        points: INVESTMENT_POINTS,
        progress_percent: Some(70),
    },
    StepDefinition {
        number: 9,
        title: "@andreia.conf",
        kind: StepKind::Message,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 10,
        title: "Suas receitas estão prontas!",
        kind: StepKind::Message,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 11,
        title: "Parabéns! 🎉",
        kind: StepKind::Message,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 12,
        title: "Açaí + Leitinho",
        kind: StepKind::VideoEpisode,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 13,
        title: "Açaí + Nutella",
        kind: StepKind::VideoEpisode,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 14,
        title: "Açaí + Maracujá",
        kind: StepKind::VideoEpisode,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 15,
        title: "Açaí + Leite Condensado",
        kind: StepKind::VideoEpisode,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 16,
        title: "Bônus Especial",
        kind: StepKind::Message,
        points: 0,
        progress_percent: None,
    },
    StepDefinition {
        number: 17,
        title: "Liberar acesso completo",
        kind: StepKind::Message,
        points: 0,
        progress_percent: None,
    },
];

pub fn step_definition(step: u32) -> Option<&'static StepDefinition> {
    STEPS.iter().find(|definition| definition.number == step)
}
