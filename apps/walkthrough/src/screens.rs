use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use funnel_core::FunnelStore;
use shared::steps::{
    step_definition, ChoiceOption, StepKind, CALL_AUTO_ADVANCE_SECS, GOAL_OPTIONS,
    INVESTMENT_OPTIONS, LAST_STEP,
};

const CHECKOUT_BENEFITS: [&str; 5] = [
    "30+ receitas premium de açaí",
    "Robô de vendas automático",
    "Guia de precificação",
    "Lista de fornecedores",
    "Suporte por WhatsApp",
];

/// Renders one step and applies its mutations once the visitor acts.
pub async fn play_step(store: &Arc<FunnelStore>, step: u32) -> Result<()> {
    let definition =
        step_definition(step).with_context(|| format!("no screen defined for step {step}"))?;
    let state = store.state().await;

    println!();
    println!("━━━ Etapa {step}/{LAST_STEP} ━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("⭐ {} pontos", state.points);
    if let Some(percent) = definition.progress_percent {
        println!("{} {percent}% completo", progress_bar(percent));
    }
    println!();
    println!("{}", definition.title);
    println!();

    match definition.kind {
        StepKind::Message => {
            wait_for_enter()?;
        }
        StepKind::GoalQuestion => {
            let option = prompt_choice("Escolha sua meta mensal", &GOAL_OPTIONS)?;
            store.set_selected_goal(option.id).await;
        }
        StepKind::InvestmentQuestion => {
            let option = prompt_choice("Para começar seu negócio de açaí", &INVESTMENT_OPTIONS)?;
            store.set_selected_investment(option.id).await;
            println!("🎉🎉🎉");
        }
        StepKind::VoiceCall => {
            for elapsed in 1..=CALL_AUTO_ADVANCE_SECS {
                println!("🔊 0:{elapsed:02}");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            println!("Chamada encerrada.");
        }
        StepKind::VideoEpisode => {
            println!("▶ Reproduzindo episódio...");
            wait_for_enter()?;
        }
    }

    if definition.points > 0 {
        store.add_points(definition.points).await;
    }
    store.complete_step(step).await?;
    Ok(())
}

/// Final stage. A successful submission resets the funnel.
pub async fn play_checkout(store: &Arc<FunnelStore>) -> Result<()> {
    println!();
    println!("━━━ Parabéns! 🎉 ━━━━━━━━━━━━━━━━━━━━━━");
    println!("Você está a um passo de transformar sua vida!");
    println!();
    println!("O que você vai receber:");
    for benefit in CHECKOUT_BENEFITS {
        println!("  ✓ {benefit}");
    }
    println!();
    println!("  De R$297,00 por R$47,00 — pagamento único");
    println!();

    let name = prompt_required("Nome")?;
    let email = prompt_required("E-mail")?;
    let phone = prompt_required("Telefone")?;

    println!();
    println!("Compra realizada com sucesso! 🎉");
    println!("Obrigado, {name}! Enviamos o acesso para {email} ({phone}).");

    store.reset().await;
    Ok(())
}

fn wait_for_enter() -> Result<()> {
    read_line("[Enter] para continuar")?;
    Ok(())
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt} ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("failed to read from stdin")?;
    Ok(input.trim().to_string())
}

/// Re-prompts until the field is non-empty; the form has no optional fields.
fn prompt_required(label: &str) -> Result<String> {
    loop {
        let value = read_line(&format!("{label}:"))?;
        if !value.is_empty() {
            return Ok(value);
        }
        println!("Preencha todos os campos!");
    }
}

fn prompt_choice<'a>(
    prompt: &str,
    options: &'a [ChoiceOption],
) -> Result<&'a ChoiceOption> {
    println!("{prompt}:");
    for (index, option) in options.iter().enumerate() {
        println!("  {}) {} — {}", index + 1, option.label, option.sublabel);
    }
    loop {
        let input = read_line("Opção:")?;
        if let Some(index) = parse_choice(&input, options.len()) {
            return Ok(&options[index]);
        }
        println!("Escolha um número entre 1 e {}.", options.len());
    }
}

fn parse_choice(input: &str, option_count: usize) -> Option<usize> {
    let selected: usize = input.trim().parse().ok()?;
    (1..=option_count).contains(&selected).then(|| selected - 1)
}

fn progress_bar(percent: u8) -> String {
    let filled = (percent as usize * 20) / 100;
    let mut bar = String::with_capacity(22);
    bar.push('[');
    for position in 0..20 {
        bar.push(if position < filled { '█' } else { '░' });
    }
    bar.push(']');
    bar
}
