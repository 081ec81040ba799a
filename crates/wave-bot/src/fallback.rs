// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Local text used when the backend cannot answer an idea request.

/// Number of mutation templates [`mutation_fallback`] picks from.
pub const MUTATION_TEMPLATE_COUNT: usize = 4;

/// `(prefix, noun used for a blank idea, suffix)`
const MUTATIONS: [(&str, &str, &str); MUTATION_TEMPLATE_COUNT] = [
    (
        "Enhanced AI-powered version: ",
        "A revolutionary platform",
        " with machine learning capabilities, real-time analytics, and predictive insights that adapt to user behavior and market trends. Features include automated workflow optimization, intelligent recommendations, and seamless integration with existing enterprise systems.",
    ),
    (
        "Market-optimized evolution: ",
        "An innovative solution",
        " redesigned for the modern digital economy with subscription-based monetization, cloud-native architecture, and mobile-first approach. Incorporates social collaboration features, sustainability metrics, and compliance with emerging data privacy regulations.",
    ),
    (
        "Trend-aligned transformation: ",
        "A cutting-edge concept",
        " enhanced with community-driven features, personalization algorithms, and cross-platform compatibility. Includes gamification elements, social sharing capabilities, and integration with popular productivity tools to maximize user engagement and retention.",
    ),
    (
        "Next-generation upgrade: ",
        "A forward-thinking platform",
        " powered by advanced AI, featuring voice interfaces, augmented reality components, and blockchain-based security. Designed for remote-first teams with real-time collaboration, automated reporting, and intelligent resource allocation.",
    ),
];

const KEY_CHANGES: [&str; 4] = [
    "Enhanced with AI and machine learning capabilities",
    "Added scalability and modern technology stack",
    "Incorporated market trends and user needs",
    "Improved business model and monetization strategy",
];

/// Mutation template `index % MUTATION_TEMPLATE_COUNT` applied to `idea`.
pub fn mutation_fallback(idea: &str, index: usize) -> String {
    let (prefix, placeholder, suffix) = MUTATIONS[index % MUTATION_TEMPLATE_COUNT];
    let idea = idea.trim();
    let subject = if idea.is_empty() { placeholder } else { idea };
    format!("{prefix}{subject}{suffix}")
}

pub fn explanation_fallback(original: &str, mutated: &str) -> String {
    let changes: Vec<String> = KEY_CHANGES.iter().map(|c| format!("• {c}")).collect();
    format!(
        "Mutation Explanation\n\nOriginal Idea: {}\nMutated Version: {}\n\nKey Changes:\n{}",
        original.trim(),
        mutated.trim(),
        changes.join("\n")
    )
}

pub fn validation_fallback(idea: &str) -> String {
    format!(
        "Validation unavailable\n\nIdea: {}\n\nThe validation service could not be reached, so no market, \
         technical, or competition scores were produced. Try again once the backend is available.",
        idea.trim()
    )
}
