//! Classifies a query into `(domain, intent, entities)`.
//!
//! Tries an LLM classification call first; on any parse failure it falls
//! back to a deterministic keyword cascade rather than surfacing the
//! error to the caller.

use std::sync::Arc;

use lawagent_core::{LegalDomain, LegalIntent, Message, Result};
use lawagent_llm::LlmClient;
use lawagent_store::Entities;
use tracing::{debug, instrument, warn};

const CLASSIFY_SYSTEM_PROMPT: &str = "你是一个法律咨询意图分类器。阅读用户的问题和已知上下文，只输出一个 JSON 对象 \
{\"domain\": ..., \"intent\": ...}，domain 取值范围 labor/family/contract/corporate/criminal/procedural/non_legal，\
intent 取值范围 qa_retrieval/case_analysis/doc_drafting/calculation/review_contract/clarification。不要输出多余内容。";

struct DomainKeywords {
    domain: LegalDomain,
    keywords: &'static [&'static str],
}

const DOMAIN_KEYWORDS: &[DomainKeywords] = &[
    DomainKeywords {
        domain: LegalDomain::Labor,
        keywords: &["裁员", "劳动合同", "工资", "辞退", "加班费", "社保", "经济补偿", "失业"],
    },
    DomainKeywords {
        domain: LegalDomain::Family,
        keywords: &["离婚", "抚养权", "婚姻", "彩礼", "遗产", "继承", "财产分割", "子女"],
    },
    DomainKeywords {
        domain: LegalDomain::Contract,
        keywords: &["合同", "违约", "协议", "条款", "定金", "履约"],
    },
    DomainKeywords {
        domain: LegalDomain::Corporate,
        keywords: &["公司", "股权", "股东", "注册资本", "公司法", "清算", "并购"],
    },
    DomainKeywords {
        domain: LegalDomain::Criminal,
        keywords: &["刑事", "犯罪", "盗窃", "诈骗", "拘留", "逮捕", "量刑", "缓刑"],
    },
    DomainKeywords {
        domain: LegalDomain::Procedural,
        keywords: &["起诉", "诉讼", "法院", "上诉", "仲裁", "立案", "管辖", "举证"],
    },
];

/// Characters broadly indicative of a legal question even when no domain
/// keyword matches, used by the ultimate routing fallback.
const LEGAL_INDICATOR_CHARS: &[char] = &['法', '律', '权', '诉', '案', '罚', '责', '判'];

struct IntentKeywords {
    intent: LegalIntent,
    keywords: &'static [&'static str],
}

const INTENT_KEYWORDS: &[IntentKeywords] = &[
    IntentKeywords {
        intent: LegalIntent::DocDrafting,
        keywords: &["写一份", "起草", "帮我写", "协议书", "合同模板", "诉状"],
    },
    IntentKeywords {
        intent: LegalIntent::Calculation,
        keywords: &["计算", "多少钱", "赔偿金额", "怎么算"],
    },
    IntentKeywords {
        intent: LegalIntent::ReviewContract,
        keywords: &["审查合同", "看看这份合同", "合同有没有问题", "帮我看看合同"],
    },
    IntentKeywords {
        intent: LegalIntent::CaseAnalysis,
        keywords: &["会怎么判", "胜诉几率", "这种情况", "我的情况"],
    },
];

pub struct RouterAgent {
    llm: Arc<LlmClient>,
}

impl RouterAgent {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    #[instrument(skip(self, query, context))]
    pub async fn route(&self, query: &str, context: &str) -> (LegalDomain, LegalIntent, Entities) {
        match self.route_via_llm(query, context).await {
            Ok((domain, intent)) => {
                let entities = entities_from_context(context);
                (domain, intent, entities)
            }
            Err(e) => {
                warn!(error = %e, "router LLM classification failed, falling back to keyword cascade");
                let (domain, intent) = keyword_cascade(query);
                (domain, intent, Entities::default())
            }
        }
    }

    async fn route_via_llm(&self, query: &str, context: &str) -> Result<(LegalDomain, LegalIntent)> {
        let user_content = if context.is_empty() {
            query.to_string()
        } else {
            format!("{context}\n\n用户问题: {query}")
        };
        let messages = vec![Message::user(user_content)];

        let reply = self.llm.chat(&messages, Some(CLASSIFY_SYSTEM_PROMPT), Some(0.1), Some(256)).await?;

        let value = crate::json::parse_json_block(&reply)?;
        let domain_label = value.get("domain").and_then(|v| v.as_str()).unwrap_or_default();
        let intent_label = value.get("intent").and_then(|v| v.as_str()).unwrap_or_default();

        let domain = LegalDomain::parse_label(domain_label).unwrap_or_else(|| fuzzy_domain_match(domain_label).unwrap_or(LegalDomain::NonLegal));
        let intent = LegalIntent::parse_label(intent_label).unwrap_or(LegalIntent::QaRetrieval);

        debug!(domain = %domain, intent = %intent, "router classified via llm");
        Ok((domain, intent))
    }
}

/// Run directly against the raw query when LLM classification is
/// unavailable: fuzzy keyword match, keyword scan, then the
/// legal-character fallback.
fn keyword_cascade(query: &str) -> (LegalDomain, LegalIntent) {
    let domain = fuzzy_domain_match(query).unwrap_or_else(|| ultimate_domain_fallback(query));
    let intent = fuzzy_intent_match(query).unwrap_or(LegalIntent::QaRetrieval);
    (domain, intent)
}

fn fuzzy_domain_match(text: &str) -> Option<LegalDomain> {
    DOMAIN_KEYWORDS
        .iter()
        .find(|dk| dk.keywords.iter().any(|kw| text.contains(kw)))
        .map(|dk| dk.domain)
}

fn fuzzy_intent_match(text: &str) -> Option<LegalIntent> {
    INTENT_KEYWORDS
        .iter()
        .find(|ik| ik.keywords.iter().any(|kw| text.contains(kw)))
        .map(|ik| ik.intent)
}

fn ultimate_domain_fallback(query: &str) -> LegalDomain {
    if query.chars().any(|c| LEGAL_INDICATOR_CHARS.contains(&c)) {
        LegalDomain::Family
    } else {
        LegalDomain::NonLegal
    }
}

/// Parse the labeled entity lines a [`lawagent_store::GlobalState`]
/// renders into its "已知事实" block, carrying them forward into a fresh
/// [`Entities`] the caller can merge.
fn entities_from_context(context: &str) -> Entities {
    let mut entities = Entities::default();
    for line in context.lines() {
        let Some((label, value)) = line.split_once(':').or_else(|| line.split_once('：')) else {
            continue;
        };
        let label = label.trim();
        let values: Vec<String> = value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        match label {
            "当事人" => entities.persons.extend(values),
            "金额" => entities.amounts.extend(values),
            "日期" => entities.dates.extend(values),
            "地点" => entities.locations.extend(values),
            _ => {}
        }
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_cascade_matches_labor_domain() {
        let (domain, _) = keyword_cascade("公司要裁员，我应该得到多少赔偿？");
        assert_eq!(domain, LegalDomain::Labor);
    }

    #[test]
    fn keyword_cascade_matches_family_domain_and_qa_intent() {
        let (domain, intent) = keyword_cascade("我想离婚，孩子的抚养权怎么判？");
        assert_eq!(domain, LegalDomain::Family);
        assert_eq!(intent, LegalIntent::QaRetrieval);
    }

    #[test]
    fn keyword_cascade_matches_doc_drafting_intent() {
        let (_, intent) = keyword_cascade("帮我写一份离婚协议书");
        assert_eq!(intent, LegalIntent::DocDrafting);
    }

    #[test]
    fn keyword_cascade_falls_back_to_non_legal_for_greeting() {
        let (domain, _) = keyword_cascade("你好");
        assert_eq!(domain, LegalDomain::NonLegal);
    }

    #[test]
    fn keyword_cascade_falls_back_to_family_for_unclassifiable_legal_text() {
        let (domain, _) = keyword_cascade("关于责任问题我想咨询一下");
        assert_eq!(domain, LegalDomain::Family);
    }

    #[test]
    fn entities_from_context_parses_labeled_lines() {
        let context = "领域: labor\n当事人: 张三, 李四\n地点: 深圳";
        let entities = entities_from_context(context);
        assert!(entities.persons.contains("张三"));
        assert!(entities.persons.contains("李四"));
        assert!(entities.locations.contains("深圳"));
    }

    #[test]
    fn entities_from_context_is_empty_for_blank_context() {
        let entities = entities_from_context("");
        assert!(entities.is_empty());
    }
}
