//! Localized user-facing comment texts.
//!
//! Posted comments are the primary failure channel: every refusal must be
//! legible from the issue thread alone, without access to process logs. The
//! tables here are static key→string lookups; marker tokens stay
//! language-neutral so parsing never depends on the selected language.

use crate::markers::DECOMPOSED_MARKER;
use crate::{Association, IssueNumber};

/// Comment language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Ja,
}

impl Language {
    /// Resolves a configured selector string.
    ///
    /// Unknown selectors fall back to English: a localization miss must not
    /// block a run.
    pub fn from_selector(selector: &str) -> Self {
        match selector.split(['-', '_']).next().unwrap_or_default() {
            "ja" => Language::Ja,
            _ => Language::En,
        }
    }
}

/// Comment for an actor whose association is not in the approval policy.
pub fn unauthorized(language: Language, required: &[Association]) -> String {
    let levels = required
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    match language {
        Language::En => format!(
            "Unauthorized approver. Only users with one of the following repository \
             associations may start execution: {levels}."
        ),
        Language::Ja => format!(
            "実行を開始する権限がありません。実行を承認できるのは、次のリポジトリ関係を持つ\
             ユーザーのみです: {levels}。"
        ),
    }
}

/// Comment for an execute request on an issue with no plan.
pub fn plan_missing(language: Language) -> String {
    match language {
        Language::En => "No implementation plan was found on this issue. \
             Run plan mode first, then approve the posted plan."
            .to_string(),
        Language::Ja => "この Issue には実装プランが見つかりませんでした。\
             先にプランモードを実行し、投稿されたプランを承認してください。"
            .to_string(),
    }
}

/// Footer explaining that a decomposed parent is not executed directly.
///
/// Appended to decomposed plans and re-posted when somebody tries to execute
/// the parent anyway. Carries the decomposition marker so the comment itself
/// remains recognisable as decomposition output.
pub fn decomposed_footer(language: Language) -> String {
    match language {
        Language::En => format!(
            "{DECOMPOSED_MARKER}\nThis plan decomposes the issue into the sub-issues \
             listed above. Cannot execute a decomposed parent issue: approve and \
             execute each sub-issue instead."
        ),
        Language::Ja => format!(
            "{DECOMPOSED_MARKER}\nこのプランは Issue を上記のサブ Issue に分割しています。\
             分割済みの親 Issue は直接実行できません。各サブ Issue を個別に承認・実行して\
             ください。"
        ),
    }
}

/// Comment naming the dependency that blocks execution.
pub fn dependency_blocked(language: Language, depends_on: IssueNumber) -> String {
    match language {
        Language::En => format!(
            "This issue depends on #{depends_on} which is not yet closed. \
             Close the dependency first, then approve again."
        ),
        Language::Ja => format!(
            "この Issue は未クローズの #{depends_on} に依存しています。\
             先に依存先をクローズしてから、再度承認してください。"
        ),
    }
}

/// Comment for a dependency marker that references a nonexistent issue.
pub fn dependency_missing(language: Language, depends_on: IssueNumber) -> String {
    match language {
        Language::En => format!(
            "The declared dependency #{depends_on} does not exist in this repository. \
             Fix the depends marker in the issue body before approving."
        ),
        Language::Ja => format!(
            "依存先として指定された #{depends_on} はこのリポジトリに存在しません。\
             Issue 本文の depends マーカーを修正してから承認してください。"
        ),
    }
}

/// Status comment posted when all gates pass and the agent starts.
pub fn starting_implementation(language: Language, branch: &str) -> String {
    match language {
        Language::En => format!(
            "Starting implementation. Work will be pushed to branch `{branch}` and a \
             pull request will be opened when it is ready for review."
        ),
        Language::Ja => format!(
            "実装を開始します。作業内容はブランチ `{branch}` にプッシュされ、レビュー可能に\
             なった時点でプルリクエストが作成されます。"
        ),
    }
}

/// Comment for an interrupted run whose branch already has an open pull request.
pub fn partial_progress(language: Language, pr_url: &str) -> String {
    match language {
        Language::En => format!(
            "The run ended before completing the plan. Partial progress is preserved in \
             the open pull request: {pr_url}"
        ),
        Language::Ja => format!(
            "実行はプラン完了前に終了しました。途中までの作業はオープン中のプルリクエストに\
             保存されています: {pr_url}"
        ),
    }
}

/// Comment for an interrupted run rescued into a fresh draft pull request.
pub fn rescue_draft_created(language: Language, pr_url: &str) -> String {
    match language {
        Language::En => format!(
            "The run ended before completing the plan. A draft pull request was created \
             so the pushed work is not lost: {pr_url}"
        ),
        Language::Ja => format!(
            "実行はプラン完了前に終了しました。プッシュ済みの作業を失わないよう、ドラフトの\
             プルリクエストを作成しました: {pr_url}"
        ),
    }
}
