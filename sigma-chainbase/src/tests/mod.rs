// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

mod scenarios;
mod tools;
