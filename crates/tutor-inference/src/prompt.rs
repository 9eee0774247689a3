//! Tutor prompt construction.
//!
//! The instruction sent to the generative model is assembled from fixed
//! sections plus a table of subject profiles. Profile selection is left to
//! the model: every active profile is listed and the model picks the one
//! that matches the card.

use std::fmt::Write as _;

use tutor_core::{PromptProfile, TranscriptionResult};

/// Teaching guidance for one subject profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileGuide {
    pub profile: PromptProfile,
    pub title: String,
    pub subjects: String,
    pub instructions: Vec<String>,
}

impl ProfileGuide {
    fn new(
        profile: PromptProfile,
        title: &str,
        subjects: &str,
        instructions: &[&str],
    ) -> Self {
        Self {
            profile,
            title: title.to_string(),
            subjects: subjects.to_string(),
            instructions: instructions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The built-in guides, one per [`PromptProfile`].
pub fn default_profile_guides() -> Vec<ProfileGuide> {
    vec![
        ProfileGuide::new(
            PromptProfile::Legal,
            "JURÍDICA / SUS / HUMANAS",
            "Direito, Legislação do SUS, Auditoria, Português",
            &[
                "Teoria: Explique o conceito, a Lei (8.080, CF/88, LRF) ou a Norma.",
                "Exemplo: Crie uma situação hipotética (ex: \"Imagine que o servidor João...\").",
            ],
        ),
        ProfileGuide::new(
            PromptProfile::Health,
            "SAÚDE / FARMÁCIA / BIOLÓGICAS",
            "Farmacologia, Química, Fisiologia",
            &[
                "Teoria: Explique o mecanismo de ação, interação ou regra da Anvisa.",
                "Exemplo: Dê um exemplo clínico (ex: \"Se um paciente idoso tomar...\").",
            ],
        ),
        ProfileGuide::new(
            PromptProfile::Quantitative,
            "EXATAS / CONTABILIDADE / ECONOMIA",
            "Matemática, RLM, Contabilidade, Economia",
            &[
                "Visão: Se houver gráfico, explique os eixos e o deslocamento das curvas.",
                "Ação: Mostre o CÁLCULO passo a passo ou o LANÇAMENTO (D/C).",
            ],
        ),
        ProfileGuide::new(
            PromptProfile::Technology,
            "TECNOLOGIA (TI)",
            "Banco de Dados, SQL, Engenharia",
            &["Visão: Se houver diagrama ER ou código, explique a lógica e o fluxo."],
        ),
    ]
}

/// Everything the builder needs for one card.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    /// Text typed on the card (may be empty).
    pub card_text: &'a str,
    /// Transcription of the first image, if one was produced.
    pub transcription: Option<&'a TranscriptionResult>,
    /// Rendered context block; never empty.
    pub context: &'a str,
    /// Whether the card images are sent alongside the prompt.
    pub images_attached: bool,
}

/// Builds the tutor instruction from a profile table.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    guides: Vec<ProfileGuide>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(default_profile_guides())
    }
}

impl PromptBuilder {
    pub fn new(guides: Vec<ProfileGuide>) -> Self {
        Self { guides }
    }

    /// Default guides restricted to `profiles`. An empty slice keeps all.
    pub fn with_profiles(profiles: &[PromptProfile]) -> Self {
        if profiles.is_empty() {
            return Self::default();
        }
        let guides = default_profile_guides()
            .into_iter()
            .filter(|g| profiles.contains(&g.profile))
            .collect();
        Self::new(guides)
    }

    pub fn profiles(&self) -> impl Iterator<Item = PromptProfile> + '_ {
        self.guides.iter().map(|g| g.profile)
    }

    /// Assemble the full instruction.
    pub fn build(&self, input: &PromptInput<'_>) -> String {
        let mut out = String::with_capacity(4096 + input.context.len());

        out.push_str(
            "ATUE COMO: Um Tutor de Elite Multidisciplinar (Auditor Fiscal e Especialista em Saúde).\n\
             CONTEXTO: O usuário faz \"Estudo Reverso\" com apoio visual.\n\n\
             SUA MISSÃO:\n\
             1. Se houver IMAGEM (Gráfico, Tabela, Diagrama, Sintaxe): Analise-a detalhadamente.\n\
             2. Identifique a matéria e o Perfil (abaixo).\n\
             3. Ministre uma MINI-AULA teórica conectando a Imagem (se houver) ao Contexto dos livros.\n\
             4. OBRIGATÓRIO: Crie um EXEMPLO PRÁTICO.\n\n",
        );

        if !self.guides.is_empty() {
            out.push_str("--- PERFIS DE RESPOSTA (Adapte a didática) ---\n\n");
            for (i, guide) in self.guides.iter().enumerate() {
                let _ = writeln!(out, "[PERFIL {}: {}]", i + 1, guide.title);
                let _ = writeln!(out, "({})", guide.subjects);
                for line in &guide.instructions {
                    let _ = writeln!(out, "- {}", line);
                }
                out.push('\n');
            }
        }

        out.push_str(
            "--- AVISOS DE QUALIDADE ---\n\
             1. CORREÇÃO DE PORTUGUÊS: Corrija palavras aglutinadas do contexto.\n\
             2. FORMATAÇÃO: NÃO use LaTeX para texto comum. Use apenas para cálculos.\n\
             3. FONTE: Baseie-se no contexto recuperado.\n\n",
        );

        out.push_str("CONTEXTO RECUPERADO (Base de Conhecimento):\n");
        out.push_str(input.context);
        out.push_str("\n\n");

        out.push_str("QUESTÃO/CARD DO ALUNO:\n");
        out.push_str(input.card_text.trim());
        out.push('\n');

        if let Some(t) = input.transcription.filter(|t| !t.is_empty()) {
            out.push_str("\nTRANSCRIÇÃO DA IMAGEM DO CARD:\n");
            out.push_str(&t.text);
            out.push('\n');
            if let Some(item_type) = t.item_type {
                let _ = writeln!(out, "Tipo de questão detectado: {}", item_type.label());
            }
            if let Some(key) = &t.answer_key {
                let _ = writeln!(out, "Gabarito visível na imagem: {}", key);
            }
        }
        if input.images_attached {
            out.push_str("\n(As imagens do card seguem anexadas a esta mensagem.)\n");
        }

        out.push_str(
            "\n--- GABARITO ---\n\
             - Se o card trouxer um gabarito (resposta marcada, \"Gabarito:\", Certo/Errado), \
             ele é a VERDADE ABSOLUTA: explique por que essa é a resposta correta.\n\
             - NUNCA contradiga o gabarito e NÃO resolva a questão de novo por conta própria \
             para chegar a outra resposta.\n\
             - Se não houver gabarito, resolva a questão com base no contexto recuperado \
             e indique a resposta com justificativa.\n\
             - Em questões de Certo/Errado, diga explicitamente CERTO ou ERRADO.\n",
        );

        out.push_str(
            "\n⚠️ REGRA DE OURO (FORMATAÇÃO):\n\
             - NÃO escreva \"Fontes:\" ou liste os arquivos no final da sua resposta.\n\
             - O sistema já fará essa listagem automaticamente.\n\
             - NÃO use LaTeX em texto corrido nem em valores monetários (ex: R$ 1.000,00).\n",
        );

        out
    }
}
