// ============================================================================
// finseries - Library
// ============================================================================
// Récupère des séries financières (Alpha Vantage, Quandl) et les trace
// ============================================================================

pub mod api;    // Clients des fournisseurs et fonctions pull_*
pub mod config; // Clés API et paramètres
pub mod error;  // Erreurs typées
pub mod models; // Structures de données
pub mod plot;   // Description pure des graphiques
pub mod ui;     // Affichage terminal et export texte
