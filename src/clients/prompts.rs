//! 分析引擎的提示词
//!
//! 分节标题直接取自 `SectionHeaders`，保证引擎输出与解析器的约定一致

use crate::config::SectionHeaders;

pub const ANALYSIS_SYSTEM_MESSAGE: &str =
    "Tu es un analyste expert des retours de communauté sur YouTube. \
Tu réponds uniquement dans le format Markdown demandé, sans texte avant ni après.";

pub const SUMMARY_SYSTEM_MESSAGE: &str =
    "Tu résumes des transcriptions de vidéos de façon fidèle et concise.";

fn none_found(spec: &crate::config::SectionSpec, fallback: &str) -> String {
    spec.none_found
        .clone()
        .unwrap_or_else(|| fallback.to_string())
}

/// 构建单批评论分析的用户消息
pub fn build_analysis_prompt(
    sections: &SectionHeaders,
    batch_lines: &[String],
    context: &str,
) -> String {
    let comments = batch_lines
        .iter()
        .map(|line| format!("- {}", line))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"# CONTEXTE : TRANSCRIPTION DE LA VIDÉO
"""
{context}
"""

# COMMENTAIRES À ANALYSER
(Chaque ligne contient l'auteur, la date et le texte exact)
{comments}

# FORMAT DE SORTIE OBLIGATOIRE
Analyse UNIQUEMENT les commentaires ci-dessus. La transcription ne sert qu'à comprendre le contexte.
Utilise exactement ces titres de section, dans cet ordre :

{sentiment}
Une phrase concise décrivant le sentiment dominant (ex : Majoritairement Positif, Négatif, Neutre, Partagé).

{summary}
Un court paragraphe (3 à 5 phrases) résumant les thèmes principaux des commentaires.

{questions}
Liste textuelle des questions posées, une par ligne précédée de "- ". Si aucune : "{questions_none} identifiée.".

{negative}
Jusqu'à 5 extraits exacts exprimant une critique, au format - "Auteur: extrait". Si aucune : "{negative_none} négative significative identifiée.".

{positive}
Jusqu'à 5 extraits exacts positifs ou constructifs, au format - "Auteur: extrait". Si aucun : "{positive_none} ou constructif notable identifié.".

{feedback}
Jusqu'à 5 extraits exacts contenant un retour détaillé ou technique, au format - "Auteur: extrait". Si aucun : "{feedback_none} spécifique ou technique identifié.".

{keywords}
De 5 à 10 mots-clés ou courtes expressions (1 à 3 mots), un par ligne précédé de "- ".

# RÈGLES
- Ne modifie jamais le texte des commentaires cités.
- N'ajoute aucune section supplémentaire.
"#,
        context = context,
        comments = comments,
        sentiment = sections.sentiment.header,
        summary = sections.summary.header,
        questions = sections.questions.header,
        questions_none = none_found(&sections.questions, "Aucune question"),
        negative = sections.negative.header,
        negative_none = none_found(&sections.negative, "Aucune critique"),
        positive = sections.positive.header,
        positive_none = none_found(&sections.positive, "Aucun commentaire positif"),
        feedback = sections.feedback.header,
        feedback_none = none_found(&sections.feedback, "Aucun feedback"),
        keywords = sections.keywords.header,
    )
}

/// 构建上下文摘要的用户消息
pub fn build_summary_prompt(context: &str) -> String {
    format!(
        "Résume la transcription suivante en un paragraphe de 5 phrases maximum, \
en français, sans inventer d'information.\n\n\"\"\"\n{}\n\"\"\"",
        context
    )
}
